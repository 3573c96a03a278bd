pub mod charts;
pub mod config;
pub mod input;
pub mod normality;
pub mod report;
pub mod special;
pub mod stats;
pub mod web;

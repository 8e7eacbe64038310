//! HTTP request handlers

pub mod actions;
pub mod health;
pub mod pages;

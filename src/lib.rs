pub mod app_config;
pub mod comment;
pub mod constants;
pub mod db;
pub mod flash;
pub mod follow;
pub mod middleware;
pub mod orm;
pub mod permission;
pub mod post;
pub mod session;
pub mod template;
pub mod user;
pub mod web;

pub mod app;
pub mod error;
pub mod messages;
pub mod models;
pub mod movies;
pub mod mymovies;
pub mod omdb;
pub mod search;
pub mod sort;

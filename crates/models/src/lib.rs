pub mod errors;
pub mod db;
pub mod user;
pub mod user_credentials;
pub mod category;
pub mod city;
pub mod anketa;
pub mod review;

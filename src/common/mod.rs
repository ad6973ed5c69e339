pub mod data_url;
pub mod errors;
pub mod helpers;
pub mod route;

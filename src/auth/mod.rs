pub mod csrf;
pub mod extractor;
pub mod jwt;
pub mod password;

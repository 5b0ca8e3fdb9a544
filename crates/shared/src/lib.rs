pub mod domain;
pub mod error;
pub mod locale;
pub mod protocol;

pub mod price;
pub mod returns;

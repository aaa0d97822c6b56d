pub mod meta;
pub mod qr;

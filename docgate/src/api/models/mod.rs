pub mod chat;
pub mod esign;
pub mod health;
pub mod ocr;
pub mod prefill;
pub mod uploads;

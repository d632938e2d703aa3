pub mod dispatch;
pub mod health;

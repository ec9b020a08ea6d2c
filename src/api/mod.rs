pub mod moneropay;

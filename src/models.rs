use sqlx::FromRow;
use chrono::NaiveDateTime;

/// Status given to every new booking by the column default.
pub const DEFAULT_STATUS: &str = "pending";

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Service {
    pub id: i64,
    pub service_name: String,
    pub price: Option<f64>,
    pub duration_minutes: Option<i64>,
}

// Booking joined with its customer and service
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct BookingDetails {
    pub id: i64,
    pub customer_name: String,
    pub phone: String,
    pub service_name: String,
    pub booking_date: String,
    pub booking_time: String,
    pub status: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

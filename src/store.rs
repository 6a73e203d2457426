//! The booking store: one owned SQLite connection and every query the
//! application runs against customers, services and bookings.
//!
//! Lookups and listings never fail: storage errors are logged and turned into
//! `None`, `false` or an empty list. Mutations return [`StoreError`].

use std::io::Write;

use log::{error, info, warn};
use sqlx::sqlite::SqliteConnection;
use sqlx::Connection;

use crate::db;
use crate::error::{Result, StoreError};
use crate::models::{BookingDetails, Customer, Service};
use crate::schema;

const BOOKING_DETAILS: &str = "SELECT b.id, c.name AS customer_name, c.phone, s.service_name,
        b.booking_date, b.booking_time, b.status, b.created_at
    FROM bookings b
    JOIN customers c ON b.customer_id = c.id
    JOIN services s ON b.service_id = s.id";

pub struct BookingStore {
    conn: SqliteConnection,
}

impl BookingStore {
    /// Connects and makes sure the schema exists, seeding the service catalog
    /// when its table is created for the first time.
    pub async fn open(database_url: &str) -> Result<Self> {
        let mut conn = db::connect(database_url).await.map_err(|e| {
            error!("Failed to connect to database: {}", e);
            StoreError::Connect(e)
        })?;

        if let Err(e) = schema::create_tables(&mut conn).await {
            error!("Failed to create tables: {}", e);
            if let Err(close_err) = conn.close().await {
                warn!("Failed to close connection after schema error: {}", close_err);
            }
            return Err(e);
        }

        info!("Connected to database");
        Ok(BookingStore { conn })
    }

    /// Opens the database named by `DATABASE_URL`.
    pub async fn from_env() -> Result<Self> {
        Self::open(&db::database_url()).await
    }

    /// Raw access to the underlying connection.
    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }

    /// Releases the connection. The store is gone afterwards, so this can only happen once.
    pub async fn close(self) {
        match self.conn.close().await {
            Ok(()) => info!("Database connection closed"),
            Err(e) => error!("Failed to close database connection: {}", e),
        }
    }

    /// Returns the id of the customer with this phone, inserting one if there is none.
    ///
    /// `Ok(None)` means the insert went through but no id came back.
    pub async fn add_customer(&mut self, name: &str, phone: &str) -> Result<Option<i64>> {
        if let Some(id) = self.query_customer_id(phone).await? {
            return Ok(Some(id));
        }

        let id: Option<i64> = sqlx::query_scalar("INSERT INTO customers (name, phone) VALUES (?, ?) RETURNING id")
            .bind(name)
            .bind(phone)
            .fetch_optional(&mut self.conn)
            .await?;
        Ok(id)
    }

    pub async fn find_customer_id_by_phone(&mut self, phone: &str) -> Option<i64> {
        self.query_customer_id(phone).await.unwrap_or_else(|e| {
            warn!("Customer lookup for phone {} failed: {}", phone, e);
            None
        })
    }

    async fn query_customer_id(&mut self, phone: &str) -> std::result::Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM customers WHERE phone = ? ORDER BY id LIMIT 1")
            .bind(phone)
            .fetch_optional(&mut self.conn)
            .await
    }

    pub async fn find_service_id_by_name(&mut self, service_name: &str) -> Option<i64> {
        sqlx::query_scalar("SELECT id FROM services WHERE service_name = ? ORDER BY id LIMIT 1")
            .bind(service_name)
            .fetch_optional(&mut self.conn)
            .await
            .unwrap_or_else(|e| {
                warn!("Service lookup for {} failed: {}", service_name, e);
                None
            })
    }

    /// Inserts a booking with the default status.
    ///
    /// Ids that point nowhere fail with [`StoreError::ReferentialIntegrity`].
    pub async fn add_booking(
        &mut self,
        customer_id: i64,
        service_id: i64,
        date: &str,
        time: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO bookings (customer_id, service_id, booking_date, booking_time) VALUES (?, ?, ?, ?)",
        )
        .bind(customer_id)
        .bind(service_id)
        .bind(date)
        .bind(time)
        .execute(&mut self.conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn booking_exists(&mut self, customer_name: &str, phone: &str, service_name: &str) -> bool {
        let count: std::result::Result<i64, sqlx::Error> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings b
             JOIN customers c ON b.customer_id = c.id
             JOIN services s ON b.service_id = s.id
             WHERE c.name = ? AND c.phone = ? AND s.service_name = ?",
        )
        .bind(customer_name)
        .bind(phone)
        .bind(service_name)
        .fetch_one(&mut self.conn)
        .await;

        match count {
            Ok(count) => count > 0,
            Err(e) => {
                warn!("Booking lookup failed: {}", e);
                false
            }
        }
    }

    /// Deletes every booking whose customer name, phone and service name all match.
    ///
    /// This is a bulk delete by attributes, not by booking id: bookings for the
    /// same customer and service on different dates are all removed together.
    /// Returns whether anything was deleted.
    pub async fn delete_booking(&mut self, customer_name: &str, phone: &str, service_name: &str) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM bookings WHERE id IN (
                SELECT b.id FROM bookings b
                JOIN customers c ON b.customer_id = c.id
                JOIN services s ON b.service_id = s.id
                WHERE c.name = ? AND c.phone = ? AND s.service_name = ?
            )",
        )
        .bind(customer_name)
        .bind(phone)
        .bind(service_name)
        .execute(&mut self.conn)
        .await?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            info!("Deleted {} booking(s) for {} / {}", deleted, phone, service_name);
        }
        Ok(deleted > 0)
    }

    pub async fn customers(&mut self) -> Vec<Customer> {
        sqlx::query_as::<_, Customer>("SELECT id, name, phone, created_at FROM customers ORDER BY id")
            .fetch_all(&mut self.conn)
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to list customers: {}", e);
                Vec::new()
            })
    }

    pub async fn services(&mut self) -> Vec<Service> {
        // DECIMAL has numeric affinity, so whole prices come back as integers without the cast
        sqlx::query_as::<_, Service>(
            "SELECT id, service_name, CAST(price AS REAL) AS price, duration_minutes FROM services ORDER BY id",
        )
        .fetch_all(&mut self.conn)
        .await
        .unwrap_or_else(|e| {
            warn!("Failed to list services: {}", e);
            Vec::new()
        })
    }

    pub async fn bookings(&mut self) -> Vec<BookingDetails> {
        let sql = format!("{} ORDER BY b.id", BOOKING_DETAILS);
        let rows = sqlx::query_as::<_, BookingDetails>(&sql)
            .fetch_all(&mut self.conn)
            .await;
        rows.unwrap_or_else(|e| {
            warn!("Failed to list bookings: {}", e);
            Vec::new()
        })
    }

    pub async fn bookings_for_phone(&mut self, phone: &str) -> Vec<BookingDetails> {
        let sql = format!("{} WHERE c.phone = ? ORDER BY b.id", BOOKING_DETAILS);
        let rows = sqlx::query_as::<_, BookingDetails>(&sql)
            .bind(phone)
            .fetch_all(&mut self.conn)
            .await;
        rows.unwrap_or_else(|e| {
            warn!("Failed to list bookings for phone {}: {}", phone, e);
            Vec::new()
        })
    }

    /// Dumps every customer and booking to `out` for manual inspection.
    pub async fn check_all_data<W: Write>(&mut self, out: &mut W) {
        if let Err(e) = self.write_all_data(out).await {
            error!("Failed to show data: {}", e);
            let _ = writeln!(out, "Error showing data: {}", e);
        }
    }

    async fn write_all_data<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let customers: Vec<Customer> = sqlx::query_as("SELECT id, name, phone, created_at FROM customers ORDER BY id")
            .fetch_all(&mut self.conn)
            .await?;
        let sql = format!("{} ORDER BY b.id", BOOKING_DETAILS);
        let bookings: Vec<BookingDetails> = sqlx::query_as(&sql)
            .fetch_all(&mut self.conn)
            .await?;

        writeln!(out, "=== All data ===")?;
        writeln!(out, "--- Customers ---")?;
        for customer in &customers {
            writeln!(out, "ID: {} | Name: {} | Phone: {}", customer.id, customer.name, customer.phone)?;
        }
        writeln!(out, "--- Bookings ---")?;
        for booking in &bookings {
            writeln!(
                out,
                "Booking #{} | Customer: {} | Phone: {} | Service: {} | Date: {} | Time: {}",
                booking.id,
                booking.customer_name,
                booking.phone,
                booking.service_name,
                booking.booking_date,
                booking.booking_time
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_STATUS;

    async fn store() -> BookingStore {
        BookingStore::open("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn add_customer_dedups_by_phone() {
        let mut store = store().await;

        let first = store.add_customer("Ali", "555-0100").await.unwrap();
        let second = store.add_customer("Ali", "555-0100").await.unwrap();
        assert_eq!(first, Some(1));
        assert_eq!(second, first);
        assert_eq!(store.customers().await.len(), 1);
    }

    #[tokio::test]
    async fn same_phone_different_name_returns_existing_customer() {
        let mut store = store().await;

        let id = store.add_customer("Ali", "555-0100").await.unwrap();
        let other = store.add_customer("Sara", "555-0100").await.unwrap();
        assert_eq!(id, other);
        assert_eq!(store.customers().await[0].name, "Ali");
    }

    #[tokio::test]
    async fn unknown_phone_is_not_found() {
        let mut store = store().await;
        store.add_customer("Ali", "555-0100").await.unwrap();

        assert_eq!(store.find_customer_id_by_phone("555-9999").await, None);
        assert_eq!(store.find_customer_id_by_phone("555-01").await, None);
    }

    #[tokio::test]
    async fn catalog_is_seeded() {
        let mut store = store().await;

        let services = store.services().await;
        let summary: Vec<_> = services
            .iter()
            .map(|s| (s.service_name.as_str(), s.price, s.duration_minutes))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("exterior wash", Some(50.0), Some(30)),
                ("interior wash", Some(70.0), Some(45)),
                ("full wash", Some(100.0), Some(60)),
            ]
        );
        assert_eq!(store.find_service_id_by_name("full wash").await, Some(3));
        assert_eq!(store.find_service_id_by_name("Full Wash").await, None);
    }

    #[tokio::test]
    async fn booking_with_missing_customer_is_rejected() {
        let mut store = store().await;

        let err = store.add_booking(42, 1, "2024-05-01", "10:00").await.unwrap_err();
        assert!(matches!(err, StoreError::ReferentialIntegrity(_)));
    }

    #[tokio::test]
    async fn booking_with_missing_service_is_rejected() {
        let mut store = store().await;
        let customer = store.add_customer("Ali", "555-0100").await.unwrap().unwrap();

        let err = store.add_booking(customer, 99, "2024-05-01", "10:00").await.unwrap_err();
        assert!(matches!(err, StoreError::ReferentialIntegrity(_)));
        assert!(store.bookings().await.is_empty());
    }

    #[tokio::test]
    async fn new_booking_is_pending() {
        let mut store = store().await;
        let customer = store.add_customer("Ali", "555-0100").await.unwrap().unwrap();

        assert!(store.add_booking(customer, 2, "2024-05-01", "10:00").await.unwrap());
        let bookings = store.bookings().await;
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].service_name, "interior wash");
        assert_eq!(bookings[0].status.as_deref(), Some(DEFAULT_STATUS));
        assert!(bookings[0].created_at.is_some());
    }

    #[tokio::test]
    async fn delete_removes_every_matching_booking() {
        let mut store = store().await;
        let customer = store.add_customer("Ali", "555-0100").await.unwrap().unwrap();
        store.add_booking(customer, 1, "2024-05-01", "10:00").await.unwrap();
        store.add_booking(customer, 1, "2024-05-08", "12:00").await.unwrap();
        store.add_booking(customer, 3, "2024-05-09", "09:00").await.unwrap();

        assert!(store.delete_booking("Ali", "555-0100", "exterior wash").await.unwrap());
        assert!(!store.booking_exists("Ali", "555-0100", "exterior wash").await);
        assert!(store.booking_exists("Ali", "555-0100", "full wash").await);
        assert!(!store.delete_booking("Ali", "555-0100", "exterior wash").await.unwrap());
    }

    #[tokio::test]
    async fn triple_must_match_exactly() {
        let mut store = store().await;
        let customer = store.add_customer("Ali", "555-0100").await.unwrap().unwrap();
        store.add_booking(customer, 1, "2024-05-01", "10:00").await.unwrap();

        assert!(!store.booking_exists("ali", "555-0100", "exterior wash").await);
        assert!(!store.delete_booking("Ali", "555-0101", "exterior wash").await.unwrap());
        assert!(store.booking_exists("Ali", "555-0100", "exterior wash").await);
    }

    #[tokio::test]
    async fn bookings_for_phone_only_returns_that_customer() {
        let mut store = store().await;
        let ali = store.add_customer("Ali", "555-0100").await.unwrap().unwrap();
        let sara = store.add_customer("Sara", "555-0200").await.unwrap().unwrap();
        store.add_booking(ali, 1, "2024-05-01", "10:00").await.unwrap();
        store.add_booking(sara, 2, "2024-05-01", "11:00").await.unwrap();

        let bookings = store.bookings_for_phone("555-0200").await;
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].customer_name, "Sara");
        assert!(store.bookings_for_phone("555-0300").await.is_empty());
    }

    #[tokio::test]
    async fn lookups_default_when_tables_are_gone() {
        let mut store = store().await;
        sqlx::query("DROP TABLE bookings").execute(store.connection()).await.unwrap();

        assert!(!store.booking_exists("Ali", "555-0100", "exterior wash").await);
        assert!(store.bookings().await.is_empty());
        assert!(store.delete_booking("Ali", "555-0100", "exterior wash").await.is_err());
    }

    #[tokio::test]
    async fn check_all_data_lists_customers_and_bookings() {
        let mut store = store().await;
        let customer = store.add_customer("Ali", "555-0100").await.unwrap().unwrap();
        store.add_booking(customer, 1, "2024-05-01", "10:00").await.unwrap();

        let mut out = Vec::new();
        store.check_all_data(&mut out).await;
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("=== All data ===\n--- Customers ---\n"));
        assert!(text.contains("ID: 1 | Name: Ali | Phone: 555-0100"));
        assert!(text.contains(
            "Booking #1 | Customer: Ali | Phone: 555-0100 | Service: exterior wash | Date: 2024-05-01 | Time: 10:00"
        ));
    }

    #[tokio::test]
    async fn check_all_data_reports_failures_inline() {
        let mut store = store().await;
        sqlx::query("DROP TABLE bookings").execute(store.connection()).await.unwrap();

        let mut out = Vec::new();
        store.check_all_data(&mut out).await;
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Error showing data:"));
    }

    #[tokio::test]
    async fn close_consumes_store() {
        let store = store().await;
        store.close().await;
    }
}

use log::{info, warn};
use sqlx::sqlite::SqliteConnection;

use crate::error::{is_already_exists, Result, StoreError};

pub const CUSTOMERS: &str = "customers";
pub const SERVICES: &str = "services";
pub const BOOKINGS: &str = "bookings";

struct Table {
    name: &'static str,
    ddl: &'static str,
}

// Plain CREATE TABLE on purpose: a fresh creation of `services` is what triggers seeding.
const TABLES: [Table; 3] = [
    Table {
        name: CUSTOMERS,
        ddl: "CREATE TABLE customers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            phone TEXT NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
    },
    Table {
        name: SERVICES,
        ddl: "CREATE TABLE services (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            service_name TEXT NOT NULL,
            price DECIMAL(10,2),
            duration_minutes INTEGER
        )",
    },
    Table {
        name: BOOKINGS,
        ddl: "CREATE TABLE bookings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id INTEGER REFERENCES customers(id),
            service_id INTEGER REFERENCES services(id),
            booking_date TEXT NOT NULL,
            booking_time TEXT NOT NULL,
            status TEXT DEFAULT 'pending',
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
    },
];

pub struct SeedService {
    pub name: &'static str,
    pub price: f64,
    pub duration_minutes: i64,
}

pub const SEED_SERVICES: [SeedService; 3] = [
    SeedService { name: "exterior wash", price: 50.00, duration_minutes: 30 },
    SeedService { name: "interior wash", price: 70.00, duration_minutes: 45 },
    SeedService { name: "full wash", price: 100.00, duration_minutes: 60 },
];

/// Creates customers, services and bookings in that order.
///
/// Tables that already exist are skipped. Any other failure stops here and
/// leaves the remaining tables absent.
pub async fn create_tables(conn: &mut SqliteConnection) -> Result<()> {
    for table in &TABLES {
        match sqlx::query(table.ddl).execute(&mut *conn).await {
            Ok(_) => {
                info!("Created table {}", table.name);
                if table.name == SERVICES {
                    seed_services(conn).await;
                }
            }
            Err(e) if is_already_exists(&e) => {
                info!("Table {} already exists", table.name);
            }
            Err(e) => {
                return Err(StoreError::Schema { table: table.name, source: e });
            }
        }
    }
    Ok(())
}

async fn seed_services(conn: &mut SqliteConnection) {
    match insert_seed_services(conn).await {
        Ok(0) => {}
        Ok(count) => info!("Seeded {} services", count),
        Err(e) => warn!("Failed to seed services: {}", e),
    }
}

async fn insert_seed_services(conn: &mut SqliteConnection) -> std::result::Result<u64, sqlx::Error> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM services")
        .fetch_one(&mut *conn)
        .await?;
    if existing != 0 {
        return Ok(0);
    }

    let mut inserted = 0;
    for service in &SEED_SERVICES {
        inserted += sqlx::query(
            "INSERT INTO services (service_name, price, duration_minutes) VALUES (?, ?, ?)",
        )
        .bind(service.name)
        .bind(service.price)
        .bind(service.duration_minutes)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    }
    Ok(inserted)
}

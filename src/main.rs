use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;

use hotelbook::config::Config;
use hotelbook::engine::{Engine, Store, WalStore};
use hotelbook::model::{Booking, Customer, Room};

#[derive(Parser)]
#[command(name = "hotelbook", version, about = "Hotel room availability and bookings")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the room inventory
    Room {
        #[command(subcommand)]
        action: RoomAction,
    },
    /// Manage customers
    Customer {
        #[command(subcommand)]
        action: CustomerAction,
    },
    /// List bookings
    Booking {
        #[command(subcommand)]
        action: BookingAction,
    },
    /// Find a room free from START through END (inclusive)
    Find { start: NaiveDate, end: NaiveDate },
    /// List dates in START..=END on which every room is taken
    Occupied { start: NaiveDate, end: NaiveDate },
    /// Book a free room from START through END (inclusive)
    Book {
        start: NaiveDate,
        end: NaiveDate,
        #[arg(long)]
        customer: i64,
    },
}

#[derive(Subcommand)]
enum RoomAction {
    Add { id: i64, description: String },
    List,
}

#[derive(Subcommand)]
enum CustomerAction {
    Add { id: i64, name: String, email: String },
    List,
}

#[derive(Subcommand)]
enum BookingAction {
    List,
}

struct Stores {
    rooms: Arc<WalStore<Room>>,
    bookings: Arc<WalStore<Booking>>,
    customers: Arc<WalStore<Customer>>,
}

impl Stores {
    fn open(config: &Config) -> std::io::Result<Self> {
        std::fs::create_dir_all(config.data_dir())?;
        Ok(Self {
            rooms: Arc::new(WalStore::open(&config.rooms_wal())?),
            bookings: Arc::new(WalStore::open(&config.bookings_wal())?),
            customers: Arc::new(WalStore::open(&config.customers_wal())?),
        })
    }

    fn engine(&self) -> Engine {
        Engine::new(self.bookings.clone(), self.rooms.clone())
    }
}

/// Ids are non-negative and unique within their kind.
fn check_new_id(kind: &str, id: i64, taken: &[i64]) -> Result<(), String> {
    if id < 0 {
        return Err(format!("{kind} ids must be non-negative"));
    }
    if taken.contains(&id) {
        return Err(format!("{kind} {id} already exists"));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = Config::from_env();
    hotelbook::observability::init(config.metrics_port)?;

    let stores = Stores::open(&config)?;
    info!("data_dir: {}", config.data_dir().display());

    let output = match cli.command {
        Command::Room { action: RoomAction::Add { id, description } } => {
            let taken: Vec<i64> = stores.rooms.get_all().await?.iter().map(|r| r.id).collect();
            check_new_id("room", id, &taken)?;
            let room = Room::new(id, description);
            stores.rooms.add(&room).await?;
            json!(room)
        }
        Command::Room { action: RoomAction::List } => json!(stores.rooms.get_all().await?),
        Command::Customer { action: CustomerAction::Add { id, name, email } } => {
            let taken: Vec<i64> = stores.customers.get_all().await?.iter().map(|c| c.id).collect();
            check_new_id("customer", id, &taken)?;
            let customer = Customer { id, name, email };
            stores.customers.add(&customer).await?;
            json!(customer)
        }
        Command::Customer { action: CustomerAction::List } => {
            json!(stores.customers.get_all().await?)
        }
        Command::Booking { action: BookingAction::List } => {
            json!(stores.bookings.get_all().await?)
        }
        Command::Find { start, end } => {
            let room_id = stores.engine().find_available_room(start, end).await?;
            json!({ "room_id": room_id, "available": room_id >= 0 })
        }
        Command::Occupied { start, end } => {
            let dates = stores.engine().fully_occupied_dates(start, end).await?;
            json!(dates)
        }
        Command::Book { start, end, customer } => {
            if !stores.customers.get_all().await?.iter().any(|c| c.id == customer) {
                return Err(format!("unknown customer {customer}").into());
            }
            let next_id = stores
                .bookings
                .get_all()
                .await?
                .iter()
                .map(|b| b.id)
                .max()
                .map_or(1, |id| id + 1);
            let mut booking = Booking::request(start, end, customer);
            booking.id = next_id;
            let created = stores.engine().create_booking(&mut booking).await?;
            json!({ "created": created, "booking": booking })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

mod providers;
mod services;

use chrono::Utc;
use chrono_tz::Europe::Berlin;
use chrono_tz::Tz;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use providers::efa::EfaClient;
use services::{departures, table};

const EFA_BASE_URL: &str = "https://efa.vrr.de/standard";
const DEFAULT_CITY: &str = "Ratingen";
/// All departure times reported by the VRR endpoint are local to this zone
const TIMEZONE: Tz = Berlin;

#[tokio::main]
async fn main() {
    // Initialize tracing; logs go to stderr so the table on stdout stays clean
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (city, station) = match args.as_slice() {
        [] => {
            println!("You have to provide at least one argument...");
            usage();
            return;
        }
        [station] => {
            println!("The city is now '{}'.", DEFAULT_CITY);
            (DEFAULT_CITY.to_string(), station.clone())
        }
        [city, station] => (city.clone(), station.clone()),
        _ => {
            println!("Too many arguments...");
            usage();
            return;
        }
    };

    match run(&city, &station).await {
        Ok(rendered) => println!("{}", rendered),
        Err(e) => {
            tracing::error!(city = %city, station = %station, "Failed to fetch departures: {}", e);
            std::process::exit(1);
        }
    }
}

/// Fetch, normalize and render departures for one stop
async fn run(
    city: &str,
    station: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let client = EfaClient::new(EFA_BASE_URL, false)?;
    let now = Utc::now().with_timezone(&TIMEZONE);

    let raw = client.get_departures(Some(city), station, now).await?;
    let stop = departures::normalize(&raw, TIMEZONE)?;

    Ok(table::departure_table(&stop))
}

fn usage() {
    println!();
    println!("Correct usage of this command");
    println!();
    println!("Version 1: departures [STATION]");
    println!("     In this case the city is '{}'.", DEFAULT_CITY);
    println!("Version 2: departures [CITY] [STATION]");
    println!("     In this case the city and station are given.");
}

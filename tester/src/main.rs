use anyhow::{bail, Result};
use clap::Parser;
use reqwest::Client;
use serde_json::{json, Value};

/// Smoke test against a running instance: log in, submit a record, read it
/// back through the listing, and fetch the stats.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, env = "BASE_URL", default_value = "http://127.0.0.1:4000")]
    base_url: String,

    #[arg(long, env = "TEST_EMAIL")]
    email: String,

    #[arg(long, env = "TEST_PASSWORD")]
    password: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = Client::new();

    let login: Value = client
        .post(format!("{}/login_user", args.base_url))
        .json(&json!({ "email": args.email, "password": args.password }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let Some(token) = login["user"]["token"].as_str() else {
        bail!("login response carried no token: {login}");
    };
    println!("Logged in as {}", login["user"]["uid"]);

    let created: Value = client
        .post(format!("{}/records", args.base_url))
        .bearer_auth(token)
        .json(&json!({
            "codigo": "SMOKE-1",
            "nombre": "Prueba de humo",
            "area": "pruebas",
            "sexo": "F",
        }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    println!("Created record {}", created["id"]);

    let records: Value = client
        .get(format!("{}/records", args.base_url))
        .bearer_auth(token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let count = records["records"].as_array().map_or(0, Vec::len);
    println!("Listing holds {count} records");

    let stats: Value = client
        .get(format!("{}/records/stats", args.base_url))
        .bearer_auth(token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let Some(fields) = stats.as_object() else {
        bail!("stats response is not an object: {stats}");
    };

    for (field, chart) in fields {
        println!(
            "{field}: {} labels, first is {:?}",
            chart["labels"].as_array().map_or(0, Vec::len),
            chart["labels"][0]
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    registro::start_server().await;
}

//! Pipeline binary entry point.

#[tokio::main]
async fn main() {
    let code = graphstudy::cli::run().await;
    std::process::exit(code);
}

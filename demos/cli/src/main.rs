use clap::Parser;
use medcard_core::{AggregatorConfig, CardOrigin};
use medcard_fhir::RecordAggregator;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "medcard-cli",
    about = "Tra cứu thẻ y tế MedCard từ kho hồ sơ FHIR."
)]
struct Args {
    /// Mã định danh bệnh nhân (chỉ để demo, không xác thực).
    #[arg(short, long)]
    identifier: String,

    /// URL gốc của kho hồ sơ FHIR R4.
    #[arg(long)]
    base_url: Option<String>,

    /// Thời gian chờ mỗi request (giây).
    #[arg(long)]
    timeout: Option<u64>,

    /// In thẻ dưới dạng JSON thay vì khối văn bản chia sẻ.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = AggregatorConfig::default();
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }

    let aggregator = RecordAggregator::from_config(&config);
    let card = aggregator.aggregate(&args.identifier).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&card)?);
    } else {
        println!("{}", card.select_all().to_text());
        if card.origin == CardOrigin::Sample {
            println!();
            println!("(Hồ sơ mẫu: không kết nối được kho hồ sơ hoặc không tìm thấy bệnh nhân.)");
        }
    }

    Ok(())
}

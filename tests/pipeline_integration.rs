//! Integration tests for the investigation pipeline
//!
//! Full validate → fetch → assemble → render runs against canned ports,
//! writing into temporary directories.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use regex::Regex;
use rust_decimal_macros::dec;
use tempfile::TempDir;

use chain_investigator::application::{InvestigationError, Investigator, ReportAssembler};
use chain_investigator::domain::{
    AccountSnapshot, ChainData, ChainFamily, ChainRecord, Derived, KindHint, MarketRecord,
    Network, NetworkHint, SourceState, TokenTransfer, TransactionDetails, TxStatus,
};
use chain_investigator::ports::mocks::{StubExplorer, StubPriceFeed};
use chain_investigator::ports::SourceError;
use chain_investigator::render::{
    ConverterSettings, CsvStatus, DocumentModel, OutputKind, PdfStatus, RenderError, Renderer,
};

const ADDR: &str = "0x00000000219ab540356cbb839cbe05303d7705fa";
const TX: &str = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";
const USDT: &str = "0xdac17f958d2ee523a2206206994597c13d831ec7";

fn account_record() -> ChainRecord {
    ChainRecord {
        source: "etherscan".into(),
        network: Network::Ethereum,
        data: ChainData::Account(AccountSnapshot {
            address: ADDR.into(),
            balance: dec!(3),
            balance_raw: 3_000_000_000_000_000_000,
            tx_count: Some(12),
            recent: Some(vec![]),
        }),
    }
}

fn transaction_record() -> ChainRecord {
    ChainRecord {
        source: "etherscan".into(),
        network: Network::Ethereum,
        data: ChainData::Transaction(TransactionDetails {
            hash: TX.into(),
            status: TxStatus::Success,
            block: Some(19_000_000),
            timestamp: None,
            from: Some(ADDR.into()),
            to: Some(USDT.into()),
            value: Some(dec!(1.5)),
            fee: Some(dec!(0.002)),
            gas_used: Some(52_000),
            transfers: vec![TokenTransfer {
                from: ADDR.into(),
                to: "0x28c6c06298d514db089934071355e5743bf21d60".into(),
                contract: USDT.into(),
                raw_amount: "250000000".into(),
                symbol: None,
                decimals: None,
                amount: None,
            }],
        }),
    }
}

fn eth_price(price: rust_decimal::Decimal) -> MarketRecord {
    MarketRecord {
        source: "coingecko".into(),
        currency: "usd".into(),
        quotes: BTreeMap::from([(Network::Ethereum, price)]),
        fetched_at: Utc::now(),
    }
}

fn no_converter() -> ConverterSettings {
    ConverterSettings {
        binary: "definitely-not-an-office-suite-4821".into(),
        ..Default::default()
    }
}

fn pipeline(
    dir: &TempDir,
    chain: Result<ChainRecord, SourceError>,
    prices: Result<MarketRecord, SourceError>,
) -> (Investigator, StubExplorer, StubPriceFeed) {
    let explorer = StubExplorer::new(ChainFamily::Evm, chain).with_name("etherscan");
    let feed = StubPriceFeed::new(prices);
    let investigator = Investigator::new(
        ReportAssembler::default(),
        Renderer::new(dir.path(), no_converter()),
    )
    .with_explorer(Arc::new(explorer.clone()))
    .with_price_feed(Arc::new(feed.clone()));
    (investigator, explorer, feed)
}

fn strip_footer(text: &str) -> String {
    let footer = Regex::new(r"Generated \d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2} UTC").unwrap();
    footer.replace_all(text, "Generated <timestamp>").into_owned()
}

#[tokio::test]
async fn test_malformed_identifiers_fail_before_any_call() {
    let dir = tempfile::tempdir().unwrap();
    let (investigator, explorer, feed) =
        pipeline(&dir, Ok(account_record()), Ok(eth_price(dec!(2000))));

    for input in [
        "",
        "0x1234",
        "0x00000000219ab540356cbb839cbe05303d7705fz",
        "T123",
        "not an address",
    ] {
        let result = investigator
            .investigate(input, KindHint::Auto, NetworkHint::Auto)
            .await;
        assert!(
            matches!(result, Err(InvestigationError::InvalidIdentifier(_))),
            "input {:?}",
            input
        );
    }

    // Valid format, wrong kind
    let result = investigator
        .investigate(ADDR, KindHint::Transaction, NetworkHint::Auto)
        .await;
    assert!(matches!(result, Err(InvestigationError::InvalidIdentifier(_))));

    assert!(explorer.calls().is_empty());
    assert!(feed.calls().is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_wallet_report_contains_fetched_fields() {
    let dir = tempfile::tempdir().unwrap();
    let (investigator, explorer, _) =
        pipeline(&dir, Ok(account_record()), Ok(eth_price(dec!(2000))));

    let inv = investigator
        .investigate(ADDR, KindHint::Address, NetworkHint::Auto)
        .await
        .unwrap();

    assert_eq!(explorer.calls(), vec![ADDR.to_string()]);
    assert_eq!(inv.report.network, Some(Network::Ethereum));
    assert_eq!(inv.report.chain.as_ref().unwrap().account().unwrap().balance, dec!(3));
    assert_eq!(inv.report.fiat_value.value().unwrap().amount, dec!(6000));
    assert!(inv.report.sources.iter().all(|s| s.is_available()));
}

#[tokio::test]
async fn test_price_failure_marks_fiat_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let (investigator, _, feed) = pipeline(
        &dir,
        Ok(account_record()),
        Err(SourceError::Network("connection refused".into())),
    );

    let inv = investigator
        .investigate(ADDR, KindHint::Auto, NetworkHint::Exact(Network::Ethereum))
        .await
        .unwrap();

    assert_eq!(feed.calls(), vec![vec![Network::Ethereum]]);
    let report = &inv.report;
    assert_eq!(report.chain.as_ref().unwrap().account().unwrap().balance, dec!(3));
    assert!(matches!(report.fiat_value, Derived::Unavailable(_)));

    let unavailable: Vec<_> = report.unavailable_sources().collect();
    assert_eq!(unavailable.len(), 1);
    match &unavailable[0].state {
        SourceState::Unavailable(reason) => assert!(reason.contains("connection refused")),
        other => panic!("expected unavailable price source, got {:?}", other),
    }

    // The document still carries the balance
    let text = DocumentModel::build(report).render_text();
    assert!(text.contains("3 ETH"));
}

#[tokio::test]
async fn test_missing_converter_still_writes_docx_and_csv() {
    let dir = tempfile::tempdir().unwrap();
    let (investigator, _, _) = pipeline(&dir, Ok(account_record()), Ok(eth_price(dec!(2000))));

    let inv = investigator
        .investigate(ADDR, KindHint::Auto, NetworkHint::Auto)
        .await
        .unwrap();

    let output = &inv.output;
    assert!(output.artifact(OutputKind::Docx).is_some());
    assert!(output.artifact(OutputKind::Csv).is_some());
    assert!(output.artifact(OutputKind::Pdf).is_none());
    assert!(matches!(
        output.pdf,
        PdfStatus::Skipped(RenderError::MissingDependency(_))
    ));
    assert!(dir.path().join(format!("report_{}.docx", ADDR)).exists());
    assert!(!dir.path().join(format!("report_{}.pdf", ADDR)).exists());
}

#[tokio::test]
async fn test_transaction_with_one_transfer() {
    let dir = tempfile::tempdir().unwrap();
    let (investigator, _, _) =
        pipeline(&dir, Ok(transaction_record()), Ok(eth_price(dec!(2000))));

    let inv = investigator
        .investigate(TX, KindHint::Auto, NetworkHint::Auto)
        .await
        .unwrap();

    let report = &inv.report;
    let details = report.chain.as_ref().unwrap().transaction().unwrap();
    assert_eq!(details.transfers.len(), 1);
    assert_eq!(report.summary.transfer_count, 1);

    let fiat = report.fiat_value.value().unwrap();
    assert_eq!(fiat.amount, dec!(3000));
    assert_eq!(fiat.unit_price, dec!(2000));
    assert_eq!(report.fee_fiat_value.value().unwrap().amount, dec!(4));

    assert!(dir.path().join(format!("report_{}.docx", TX)).exists());
    let csv_path = dir.path().join(format!("report_{}.csv", TX));
    assert!(csv_path.exists());
    assert!(matches!(inv.output.csv, CsvStatus::Written));

    let csv = std::fs::read_to_string(csv_path).unwrap();
    assert!(csv.lines().any(|l| l.starts_with("token_transfer,ethereum,")));
    assert!(csv.lines().any(|l| l.starts_with("transaction,ethereum,") && l.ends_with(",3000")));
}

#[tokio::test]
async fn test_no_data_omits_csv() {
    let dir = tempfile::tempdir().unwrap();
    let (investigator, _, _) = pipeline(
        &dir,
        Err(SourceError::NotFound("transaction unknown".into())),
        Err(SourceError::RateLimited {
            provider: "coingecko".into(),
        }),
    );

    let inv = investigator
        .investigate(TX, KindHint::Auto, NetworkHint::Auto)
        .await
        .unwrap();

    assert!(inv.report.chain.is_none());
    assert!(inv.report.market.is_none());
    assert_eq!(inv.report.unavailable_sources().count(), 2);
    assert!(matches!(inv.output.csv, CsvStatus::Omitted(_)));
    assert!(dir.path().join(format!("report_{}.docx", TX)).exists());
    assert!(!dir.path().join(format!("report_{}.csv", TX)).exists());
}

#[tokio::test]
async fn test_identical_inputs_give_identical_output() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    let (first, _, _) = pipeline(&dir_a, Ok(transaction_record()), Ok(eth_price(dec!(2000))));
    let (second, _, _) = pipeline(&dir_b, Ok(transaction_record()), Ok(eth_price(dec!(2000))));

    let a = first
        .investigate(TX, KindHint::Auto, NetworkHint::Auto)
        .await
        .unwrap();
    let b = second
        .investigate(TX, KindHint::Auto, NetworkHint::Auto)
        .await
        .unwrap();

    let text_a = strip_footer(&DocumentModel::build(&a.report).render_text());
    let text_b = strip_footer(&DocumentModel::build(&b.report).render_text());
    assert_eq!(text_a, text_b);
    assert!(text_a.contains("Generated <timestamp>"));

    let csv_name = format!("report_{}.csv", TX);
    assert_eq!(
        std::fs::read(dir_a.path().join(&csv_name)).unwrap(),
        std::fs::read(dir_b.path().join(&csv_name)).unwrap()
    );
}

#[tokio::test]
async fn test_rerun_overwrites_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let (investigator, _, _) = pipeline(&dir, Ok(account_record()), Ok(eth_price(dec!(2000))));

    for _ in 0..2 {
        investigator
            .investigate(ADDR, KindHint::Auto, NetworkHint::Auto)
            .await
            .unwrap();
    }

    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![format!("report_{}.csv", ADDR), format!("report_{}.docx", ADDR)]
    );
}

#[tokio::test]
async fn test_failed_rerun_removes_previous_csv() {
    let dir = tempfile::tempdir().unwrap();
    let (good, _, _) = pipeline(&dir, Ok(account_record()), Ok(eth_price(dec!(2000))));
    let csv_path = dir.path().join(format!("report_{}.csv", ADDR));

    good.investigate(ADDR, KindHint::Auto, NetworkHint::Auto)
        .await
        .unwrap();
    assert!(csv_path.exists());

    let (broken, _, _) = pipeline(
        &dir,
        Err(SourceError::Network("connection reset".into())),
        Err(SourceError::Network("connection reset".into())),
    );
    let inv = broken
        .investigate(ADDR, KindHint::Auto, NetworkHint::Auto)
        .await
        .unwrap();

    assert!(matches!(inv.output.csv, CsvStatus::Omitted(_)));
    assert!(inv.output.artifact(OutputKind::Csv).is_none());
    assert!(!csv_path.exists());
    assert!(dir.path().join(format!("report_{}.docx", ADDR)).exists());
}

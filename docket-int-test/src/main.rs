use docket::codec::CodecKind;
use docket::errors::DocketResult;
use docket::filter::{all, Filter};
use docket::record;
use docket_int_test::test_util::{cleanup, create_test_context};

fn main() -> DocketResult<()> {
    println!("Starting stress test...");
    let ctx = create_test_context(CodecKind::TypedField)?;
    let db = ctx.db();

    let count = 100_000;
    let start = std::time::Instant::now();
    for i in 0..count {
        db.insert(
            "stress",
            record! {
                "first_name": uuid::Uuid::new_v4().to_string(),
                "last_name": uuid::Uuid::new_v4().to_string(),
                "sequence": i,
                "processed": false,
                "failed": false,
            },
        )?;
    }
    println!("Inserted {} records in {:?}", count, start.elapsed());

    let start = std::time::Instant::now();
    let pending = db.find("stress", &Filter::new().eq("failed", false))?;
    println!("Found {} pending records in {:?}", pending.len(), start.elapsed());

    let start = std::time::Instant::now();
    let updated = db.update("stress", &all(), &record! { "processed": true })?;
    println!("Updated {} records in {:?}", updated.len(), start.elapsed());

    let start = std::time::Instant::now();
    let first = db.find(
        "stress",
        &Filter::new().eq("processed", true).sort_by("sequence").limit(10),
    )?;
    println!("Fetched first {} processed records in {:?}", first.len(), start.elapsed());

    cleanup(ctx)
}

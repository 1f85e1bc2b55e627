use tapestry::{build_slice, load_slices, write_slice, TrendingPayload};

fn payload(rows: usize) -> TrendingPayload {
    let rows: Vec<String> = (0..rows)
        .map(|i| {
            format!(
                r#"{{"repo_id":"{i}","repo_name":"owner/repo{i}","primary_language":"Rust","description":"d","stars":"2100","forks":"3","total_score":"87.5"}}"#
            )
        })
        .collect();
    let json = format!(r#"{{"data":{{"rows":[{}]}}}}"#, rows.join(","));
    serde_json::from_str(&json).unwrap()
}

#[test]
fn written_slice_reads_back_with_same_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("daily");
    let latest = dir.path().join("latest.json");

    let slice = build_slice(&payload(10), "2025-06-01").unwrap();
    write_slice(&slice, &data_dir, &latest).unwrap();

    let loaded = load_slices(&data_dir, 90).unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0], slice);
    assert_eq!(loaded[0].metrics.total_stars, 21_000);
    assert_eq!(loaded[0].metrics.avg_score, 87.5);
    assert_eq!(loaded[0].metrics.dominant_language, "Rust");
    loaded[0].validate().unwrap();
}

#[test]
fn same_date_rerun_overwrites_byte_identically() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("daily");
    let latest = dir.path().join("latest.json");

    let slice = build_slice(&payload(7), "2025-06-01").unwrap();
    let path = write_slice(&slice, &data_dir, &latest).unwrap();
    let first = std::fs::read(&path).unwrap();

    let again = build_slice(&payload(7), "2025-06-01").unwrap();
    write_slice(&again, &data_dir, &latest).unwrap();

    assert_eq!(std::fs::read_dir(&data_dir).unwrap().count(), 1);
    assert_eq!(first, std::fs::read(&path).unwrap());
}

#[test]
fn latest_pointer_mirrors_the_dated_slice() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("daily");
    let latest = dir.path().join("latest.json");

    let slice = build_slice(&payload(3), "2025-06-01").unwrap();
    let path = write_slice(&slice, &data_dir, &latest).unwrap();

    assert_eq!(
        std::fs::read(&path).unwrap(),
        std::fs::read(&latest).unwrap()
    );
}

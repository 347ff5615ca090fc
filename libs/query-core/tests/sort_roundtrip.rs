use query_core::{parse_sort, Error, SortOrder, SortSpec};

const FORECAST_FIELDS: &[&str] = &[
    "zone_id",
    "bucket_start_ts",
    "y_pred",
    "confidence_score",
    "borough",
];

#[test]
fn every_allowed_field_and_order_roundtrips() {
    for field in FORECAST_FIELDS {
        for (token, order) in [("asc", SortOrder::Asc), ("desc", SortOrder::Desc)] {
            let raw = format!("{field}:{token}");
            let spec = parse_sort(Some(&raw), "bucket_start_ts:desc", FORECAST_FIELDS)
                .expect("allowed sort must parse");
            assert_eq!(spec, SortSpec::new(*field, order));
            assert_eq!(spec.to_string(), raw);
        }
    }
}

#[test]
fn fields_outside_allow_list_fail_for_any_order() {
    for order in ["asc", "desc", "sideways"] {
        let raw = format!("final_multiplier:{order}");
        let err = parse_sort(Some(&raw), "bucket_start_ts:desc", FORECAST_FIELDS).unwrap_err();
        let rejected_field = match &err {
            Error::UnsupportedSortField { field, .. } => Some(field.as_str()),
            _ => None,
        };
        assert_eq!(
            rejected_field,
            Some("final_multiplier"),
            "unexpected error for {raw}: {err:?}"
        );
        assert_eq!(err.parameter(), "sort");
    }
}

use ludex_domain::{GameMetadata, pager, query::{PreferenceQuery, Query}};

#[test]
fn metadata_backfills_missing_payload_fields() {
	let raw = serde_json::json!({
		"name": "Portal",
		"steam_appid": 400,
	});
	let metadata: GameMetadata =
		serde_json::from_value(raw).expect("Failed to deserialize payload.");

	assert_eq!(metadata.name, "Portal");
	assert_eq!(metadata.steam_appid, 400);
	assert_eq!(metadata.price, 0.0);
	assert_eq!(metadata.genres, "");
	assert_eq!(metadata.developers, "");
}

#[test]
fn genre_labels_are_lowercased_and_trimmed() {
	let metadata = GameMetadata {
		genres: "Action, RPG , ,Indie".to_string(),
		..GameMetadata::default()
	};

	assert_eq!(metadata.genre_labels(), vec!["action", "rpg", "indie"]);
}

#[test]
fn page_serializes_with_stable_shape() {
	let page = pager::paginate(vec!["a", "b", "c"], 2, 0);
	let json = serde_json::to_value(&page).expect("Failed to serialize page.");

	assert_eq!(json["items"], serde_json::json!(["a", "b"]));
	assert_eq!(json["total"], 3);
	assert_eq!(json["page"], 1);
	assert_eq!(json["page_size"], 2);
	assert_eq!(json["pages"], 2);
}

#[test]
fn query_validation_dispatches_per_variant() {
	let query = Query::Preference(PreferenceQuery {
		positive_ids: vec![" 10 ".to_string(), "10".to_string()],
		negative_ids: vec!["30".to_string()],
		excluded_ids: Vec::new(),
		limit: 9,
		offset: 0,
		diversity_factor: Some(0.3),
		random_seed: Some(7),
	})
	.validate()
	.expect("validate failed");

	let Query::Preference(preference) = query else {
		panic!("Expected a preference query.");
	};

	assert_eq!(preference.positive_ids, vec!["10".to_string()]);
	assert_eq!(preference.negative_ids, vec!["30".to_string()]);
}

use cbio_config::Postgres;
use cbio_storage::{
	db::Db,
	queries::{self, Direction, Projection, StudyQuery, StudySortBy},
};
use cbio_testkit::TestDatabase;

async fn seeded_db(test_db: &TestDatabase) -> Db {
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	sqlx::query(
		"\
INSERT INTO type_of_cancer (type_of_cancer_id, name, parent)
VALUES
	('tissue', 'Tissue', NULL),
	('lung', 'Lung', 'tissue'),
	('luad', 'Lung Adenocarcinoma', 'lung'),
	('breast', 'Breast', 'tissue'),
	('brca', 'Invasive Breast Carcinoma', 'breast')",
	)
	.execute(&db.pool)
	.await
	.expect("Failed to seed cancer types.");
	sqlx::query(
		"\
INSERT INTO cancer_study (cancer_study_identifier, type_of_cancer_id, name, description, groups)
VALUES
	('luad_tcga', 'luad', 'Lung Adenocarcinoma (TCGA)', 'TCGA lung cohort', 'PUBLIC'),
	('brca_tcga', 'brca', 'Breast Invasive Carcinoma (TCGA)', 'TCGA breast cohort', 'PUBLIC'),
	('brca_metabric', 'brca', 'METABRIC', 'Molecular taxonomy', 'METABRIC;PUBLIC')",
	)
	.execute(&db.pool)
	.await
	.expect("Failed to seed studies.");
	sqlx::query(
		"\
INSERT INTO cancer_study_tags (cancer_study_id, tags)
SELECT cancer_study_id, '{\"source\": \"TCGA\"}'::jsonb
FROM cancer_study
WHERE cancer_study_identifier = 'luad_tcga'",
	)
	.execute(&db.pool)
	.await
	.expect("Failed to seed tags.");
	sqlx::query(
		"\
INSERT INTO sample (stable_id, cancer_study_id)
SELECT 'S-' || n, cancer_study_id
FROM cancer_study, generate_series(1, 3) AS n
WHERE cancer_study_identifier = 'luad_tcga'",
	)
	.execute(&db.pool)
	.await
	.expect("Failed to seed samples.");

	db
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CBIO_PG_DSN to run."]
async fn db_connects_and_bootstraps() {
	let Some(base_dsn) = cbio_testkit::env_dsn() else {
		eprintln!("Skipping db_connects_and_bootstraps; set CBIO_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");
	db.ensure_schema().await.expect("Schema bootstrap must be idempotent.");

	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM information_schema.tables WHERE table_name = 'cancer_study_tags'",
	)
	.fetch_one(&db.pool)
	.await
	.expect("Failed to query schema tables.");

	assert_eq!(count, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CBIO_PG_DSN to run."]
async fn keyword_sort_and_pagination_are_applied_in_sql() {
	let Some(base_dsn) = cbio_testkit::env_dsn() else {
		eprintln!("Skipping keyword_sort_and_pagination_are_applied_in_sql; set CBIO_PG_DSN.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = seeded_db(&test_db).await;
	let query = StudyQuery {
		keyword: Some("tcga".to_string()),
		sort_by: Some(StudySortBy::StudyId),
		direction: Some(Direction::Desc),
		..Default::default()
	};
	let studies = queries::get_all_studies(&db, &query).await.expect("Query failed.");
	let ids: Vec<&str> =
		studies.iter().map(|study| study.cancer_study_identifier.as_str()).collect();

	assert_eq!(ids, vec!["luad_tcga", "brca_tcga"]);

	let page = StudyQuery {
		page_size: Some(1),
		page_number: Some(1),
		..StudyQuery::unfiltered(Projection::Summary)
	};
	let studies = queries::get_all_studies(&db, &page).await.expect("Query failed.");

	assert_eq!(studies.len(), 1);
	assert_eq!(studies[0].cancer_study_identifier, "brca_tcga");

	let count = queries::get_meta_studies(&db, Some("breast carcinoma")).await.expect("Count.");

	assert_eq!(count, 2);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CBIO_PG_DSN to run."]
async fn detailed_lookups_attach_cancer_type_and_counts() {
	let Some(base_dsn) = cbio_testkit::env_dsn() else {
		eprintln!("Skipping detailed_lookups_attach_cancer_type_and_counts; set CBIO_PG_DSN.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = seeded_db(&test_db).await;
	let study = queries::get_study(&db, "luad_tcga", Projection::Detailed)
		.await
		.expect("Query failed.")
		.expect("Study should exist.");

	assert_eq!(study.all_sample_count, Some(3));
	assert_eq!(
		study.type_of_cancer.as_ref().map(|toc| toc.name.as_str()),
		Some("Lung Adenocarcinoma")
	);
	assert!(
		queries::get_study(&db, "missing", Projection::Summary)
			.await
			.expect("Query failed.")
			.is_none()
	);

	let ids = vec!["brca_metabric".to_string(), "luad_tcga".to_string(), "nope".to_string()];
	let studies = queries::fetch_studies(&db, &ids, Projection::Id).await.expect("Fetch.");

	assert_eq!(studies.len(), 2);
	assert_eq!(studies[0].description, None);
	assert_eq!(queries::fetch_meta_studies(&db, &ids).await.expect("Count."), 2);

	let tags = queries::get_tags(&db, "luad_tcga").await.expect("Tags.").expect("Tags exist.");

	assert_eq!(tags.tags["source"], "TCGA");
	assert!(queries::get_tags(&db, "brca_tcga").await.expect("Tags.").is_none());
	assert_eq!(
		queries::get_tags_for_multiple_studies(&db, &ids).await.expect("Tags.").len(),
		1
	);
	assert_eq!(queries::get_cancer_types(&db).await.expect("Types.").len(), 5);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

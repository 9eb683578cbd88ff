use fsd_site::db::Database;
use fsd_site::error::ContentError;
use fsd_site::models::*;
use fsd_site::render::{Document, Node};
use serde_json::json;
use speculate2::speculate;

fn topic_input(slug: &str, title: &str, order: i64) -> CreateTopicInput {
    CreateTopicInput {
        order: Some(order),
        ..CreateTopicInput::new(slug, title)
    }
}

fn resource_input(title: &str, url: &str, tags: &[&str]) -> CreateResourceInput {
    CreateResourceInput {
        title: title.to_string(),
        url: url.to_string(),
        kind: ResourceKind::Article,
        description: None,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "topics" {
        describe "create_topic" {
            it "creates a topic with required fields" {
                let topic = db.create_topic(CreateTopicInput::new("caching", "Caching"))
                    .expect("Failed to create topic");

                assert_eq!(topic.slug, "caching");
                assert_eq!(topic.title, "Caching");
                assert_eq!(topic.order, 0);
                assert!(topic.theory.is_none());
                assert!(topic.animations.is_empty());
            }

            it "round-trips theory, references, practice and animations" {
                let input = CreateTopicInput {
                    summary: Some("How browsers reuse responses".to_string()),
                    theory: Some(Document::new(vec![Node::Paragraph {
                        children: vec![Node::text("Cache-Control matters.")],
                    }])),
                    references: vec![Reference {
                        title: "MDN HTTP caching".to_string(),
                        url: "https://developer.mozilla.org/docs/Web/HTTP/Caching".to_string(),
                        note: None,
                    }],
                    practice: Some(Practice {
                        steps: vec!["Open devtools".to_string()],
                        ..Default::default()
                    }),
                    animations: vec![AnimationBlock {
                        title: Some("Revalidation".to_string()),
                        caption: None,
                        spec: json!({ "version": 1, "kind": "diff2d" }),
                    }],
                    ..topic_input("caching", "Caching", 3)
                };
                db.create_topic(input).expect("Failed to create topic");

                let topic = db.get_topic_by_slug("caching").expect("Query failed").unwrap();
                assert_eq!(topic.order, 3);
                assert_eq!(topic.summary.as_deref(), Some("How browsers reuse responses"));
                assert_eq!(topic.theory.unwrap().root.text_content(), "Cache-Control matters.");
                assert_eq!(topic.references.len(), 1);
                assert_eq!(topic.practice.unwrap().steps, vec!["Open devtools"]);
                assert_eq!(topic.animations[0].spec["kind"], "diff2d");
            }

            it "rejects an invalid slug" {
                let err = db.create_topic(CreateTopicInput::new("Not A Slug", "Bad"))
                    .unwrap_err();
                assert_eq!(
                    err.downcast_ref::<ContentError>(),
                    Some(&ContentError::InvalidSlug("Not A Slug".to_string()))
                );
            }

            it "rejects an empty title" {
                let err = db.create_topic(CreateTopicInput::new("empty", "  ")).unwrap_err();
                assert_eq!(err.downcast_ref::<ContentError>(), Some(&ContentError::EmptyTitle));
            }

            it "rejects a duplicate slug" {
                db.create_topic(CreateTopicInput::new("caching", "Caching")).expect("Failed to create");
                let err = db.create_topic(CreateTopicInput::new("caching", "Again")).unwrap_err();
                assert_eq!(
                    err.downcast_ref::<ContentError>(),
                    Some(&ContentError::DuplicateSlug("caching".to_string()))
                );
            }
        }

        describe "get_all_topics" {
            it "returns empty list when no topics exist" {
                let topics = db.get_all_topics().expect("Query failed");
                assert!(topics.is_empty());
            }

            it "orders by curriculum position, then title" {
                db.create_topic(topic_input("zeta", "Zeta", 2)).expect("Failed to create");
                db.create_topic(topic_input("beta", "Beta", 1)).expect("Failed to create");
                db.create_topic(topic_input("alpha", "Alpha", 2)).expect("Failed to create");

                let slugs: Vec<String> = db.get_all_topics().expect("Query failed")
                    .into_iter().map(|t| t.slug).collect();
                assert_eq!(slugs, vec!["beta", "alpha", "zeta"]);
            }
        }

        describe "get_topic_by_slug" {
            it "returns None for a missing slug" {
                assert!(db.get_topic_by_slug("missing").expect("Query failed").is_none());
            }
        }

        describe "update_topic" {
            it "changes only the given fields" {
                db.create_topic(topic_input("caching", "Caching", 1)).expect("Failed to create");

                let updated = db.update_topic("caching", UpdateTopicInput {
                    title: Some("HTTP Caching".to_string()),
                    ..Default::default()
                }).expect("Update failed").unwrap();

                assert_eq!(updated.title, "HTTP Caching");
                assert_eq!(updated.order, 1);
                assert!(updated.updated_at >= updated.created_at);
            }

            it "returns None for a missing slug" {
                let result = db.update_topic("missing", UpdateTopicInput::default())
                    .expect("Update failed");
                assert!(result.is_none());
            }
        }

        describe "delete_topic" {
            it "removes the topic" {
                db.create_topic(CreateTopicInput::new("caching", "Caching")).expect("Failed to create");

                assert!(db.delete_topic("caching").expect("Delete failed"));
                assert!(!db.delete_topic("caching").expect("Delete failed"));
                assert!(db.get_topic_by_slug("caching").expect("Query failed").is_none());
            }
        }
    }

    describe "resources" {
        it "filters by tag" {
            db.create_resource(resource_input("Web Vitals", "https://web.dev/vitals", &["performance"]))
                .expect("Failed to create");
            db.create_resource(resource_input("Caching Guide", "https://web.dev/http-cache", &["caching", "performance"]))
                .expect("Failed to create");

            let caching = db.get_resources_by_tag("caching").expect("Query failed");
            assert_eq!(caching.len(), 1);
            assert_eq!(caching[0].title, "Caching Guide");

            let performance = db.get_resources_by_tag("performance").expect("Query failed");
            assert_eq!(performance.len(), 2);

            assert!(db.get_resources_by_tag("css").expect("Query failed").is_empty());
        }

        it "updates in place when the URL already exists" {
            let first = db.create_resource(resource_input("Old", "https://web.dev/vitals", &[]))
                .expect("Failed to create");
            let second = db.create_resource(resource_input("New", "https://web.dev/vitals", &["perf"]))
                .expect("Failed to create");

            assert_eq!(first.id, second.id);
            let all = db.get_all_resources().expect("Query failed");
            assert_eq!(all.len(), 1);
            assert_eq!(all[0].title, "New");
            assert_eq!(all[0].tags, vec!["perf"]);
        }
    }

    describe "pages" {
        it "creates and finds a page by slug" {
            db.create_page(CreatePageInput {
                slug: "about".to_string(),
                title: "About".to_string(),
                content: None,
            }).expect("Failed to create");

            let page = db.get_page_by_slug("about").expect("Query failed").unwrap();
            assert_eq!(page.title, "About");
            assert_eq!(db.get_all_pages().expect("Query failed").len(), 1);
        }
    }

    describe "import_bundle" {
        it "imports everything and is idempotent" {
            let bundle = ContentBundle {
                topics: vec![topic_input("rendering", "Rendering", 1), topic_input("caching", "Caching", 2)],
                resources: vec![resource_input("Web Vitals", "https://web.dev/vitals", &["performance"])],
                pages: vec![CreatePageInput {
                    slug: "about".to_string(),
                    title: "About".to_string(),
                    content: None,
                }],
            };

            let summary = db.import_bundle(bundle.clone()).expect("Import failed");
            assert_eq!(summary, ImportSummary { topics: 2, resources: 1, pages: 1 });

            db.import_bundle(bundle).expect("Second import failed");
            assert_eq!(db.get_all_topics().expect("Query failed").len(), 2);
            assert_eq!(db.get_all_resources().expect("Query failed").len(), 1);
            assert_eq!(db.get_all_pages().expect("Query failed").len(), 1);
        }

        it "imports the demo curriculum with valid animations" {
            let bundle: ContentBundle = serde_json::from_str(include_str!("../demos/curriculum.json"))
                .expect("Demo bundle should parse");

            let summary = db.import_bundle(bundle).expect("Import failed");
            assert_eq!(summary, ImportSummary { topics: 2, resources: 2, pages: 1 });

            for topic in db.get_all_topics().expect("Query failed") {
                for block in &topic.animations {
                    assert!(fsd_site::animation::parse_spec(&block.spec).is_ok(), "{:?}", block.title);
                }
            }
        }

        it "rolls back when one record is invalid" {
            let bundle = ContentBundle {
                topics: vec![topic_input("caching", "Caching", 1), topic_input("Bad Slug", "Bad", 2)],
                ..Default::default()
            };

            assert!(db.import_bundle(bundle).is_err());
            assert!(db.get_all_topics().expect("Query failed").is_empty());
        }
    }

    describe "open" {
        it "persists content to a file across reopen" {
            let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = temp_dir.path().join("nested").join("content.db");

            let file_db = Database::open(path.clone()).expect("Failed to open");
            file_db.migrate().expect("Failed to migrate");
            file_db.create_topic(CreateTopicInput::new("caching", "Caching")).expect("Failed to create");
            drop(file_db);

            let reopened = Database::open(path).expect("Failed to reopen");
            reopened.migrate().expect("Migrations should be idempotent");
            assert!(reopened.get_topic_by_slug("caching").expect("Query failed").is_some());
        }
    }
}

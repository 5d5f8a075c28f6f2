use chore_bot::db::Database;
use chore_bot::models::*;
use chrono::{NaiveDate, NaiveTime};
use speculate2::speculate;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("Invalid test date")
}

fn create_test_chore(db: &Database, name: &str, assignee: &str) -> Chore {
    db.create_chore(CreateChoreInput {
        name: name.to_string(),
        category: Some(Category::Kitchen),
        mode: AssignMode::Fixed,
        assignee: assignee.to_string(),
        interval_days: 7,
        start_date: None,
        time: NaiveTime::from_hms_opt(21, 0, 0).expect("Invalid time"),
    })
    .expect("Failed to create chore")
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "household" {
        it "starts with nobody set" {
            let household = db.get_household().expect("Query failed");
            assert_eq!(household, Household::default());
        }

        it "rotates between the two people" {
            db.set_people("Alice", "Bob").expect("Failed to set people");

            let picks: Vec<String> = (0..4)
                .map(|_| db.next_rotation_assignee().expect("Query failed").expect("No people"))
                .collect();

            assert_eq!(picks, vec!["Alice", "Bob", "Alice", "Bob"]);
            assert_eq!(db.get_household().expect("Query failed").rotate_index, 4);
        }

        it "restarts the rotation when people change" {
            db.set_people("Alice", "Bob").expect("Failed to set people");
            db.next_rotation_assignee().expect("Query failed");

            db.set_people("Carol", "Dan").expect("Failed to set people");
            let next = db.next_rotation_assignee().expect("Query failed");
            assert_eq!(next.as_deref(), Some("Carol"));
        }

        it "returns None without moving the cursor when people are unset" {
            assert_eq!(db.next_rotation_assignee().expect("Query failed"), None);
            assert_eq!(db.get_household().expect("Query failed").rotate_index, 0);
        }
    }

    describe "chores" {
        it "creates a chore with all fields" {
            let chore = db.create_chore(CreateChoreInput {
                name: "mopping".to_string(),
                category: Some(Category::DailyCleaning),
                mode: AssignMode::Rotate,
                assignee: "Alice".to_string(),
                interval_days: 3,
                start_date: Some(date("2024-02-01")),
                time: NaiveTime::from_hms_opt(7, 30, 0).expect("Invalid time"),
            }).expect("Failed to create chore");

            let found = db.get_chore(chore.id).expect("Query failed").expect("Chore missing");
            assert_eq!(found, chore);
            assert_eq!(found.category, Some(Category::DailyCleaning));
            assert_eq!(found.mode, AssignMode::Rotate);
            assert_eq!(found.start_date, Some(date("2024-02-01")));
            assert!(found.last_done.is_none());
        }

        it "lists chores in id order" {
            let first = create_test_chore(&db, "dishes", "Alice");
            let second = create_test_chore(&db, "bins", "Bob");

            let ids: Vec<i64> = db.list_chores().expect("Query failed").iter().map(|c| c.id).collect();
            assert_eq!(ids, vec![first.id, second.id]);
        }

        it "reports whether a delete removed anything" {
            let chore = create_test_chore(&db, "dishes", "Alice");
            assert!(db.delete_chore(chore.id).expect("Delete failed"));
            assert!(!db.delete_chore(chore.id).expect("Delete failed"));
            assert!(db.get_chore(chore.id).expect("Query failed").is_none());
        }

        it "skip sets skip_until and clears the reminder marker" {
            let chore = create_test_chore(&db, "dishes", "Alice");
            db.mark_reminded(chore.id, date("2024-01-08")).expect("Update failed");

            assert!(db.skip_chore(chore.id, date("2024-01-08")).expect("Skip failed"));

            let found = db.get_chore(chore.id).expect("Query failed").expect("Chore missing");
            assert_eq!(found.skip_until, Some(date("2024-01-08")));
            assert_eq!(found.last_reminded, None);
        }

        it "skip of a missing chore reports false" {
            assert!(!db.skip_chore(999, date("2024-01-08")).expect("Skip failed"));
        }
    }

    describe "record_completion" {
        it "appends one row and keeps the assignee" {
            let chore = create_test_chore(&db, "dishes", "Alice");
            db.skip_chore(chore.id, date("2024-01-08")).expect("Skip failed");

            let receipt = db
                .record_completion(chore.id, "Bob", date("2024-01-08"))
                .expect("Completion failed")
                .expect("Chore missing");

            assert_eq!(receipt.completion.assigned_to, "Alice");
            assert_eq!(receipt.completion.completed_by, "Bob");
            assert!(receipt.completion.is_cover());
            assert_eq!(receipt.interval_days, 7);

            let found = db.get_chore(chore.id).expect("Query failed").expect("Chore missing");
            assert_eq!(found.assignee, "Alice");
            assert_eq!(found.last_done, Some(date("2024-01-08")));
            assert_eq!(found.skip_until, None);
            assert_eq!(found.last_reminded, None);

            let history = db.get_history(&HistoryFilter::All, date("2024-01-08"), 50).expect("Query failed");
            assert_eq!(history, vec![receipt.completion]);
        }

        it "counts covers the same way in history and stats" {
            let chore = create_test_chore(&db, "dishes", "Élise");
            let receipt = db
                .record_completion(chore.id, "élise", date("2024-01-08"))
                .expect("Completion failed")
                .expect("Chore missing");
            db.record_completion(chore.id, "ÉLISE", date("2024-01-08")).expect("Completion failed");

            let stats = db.get_lifetime_stats().expect("Query failed");
            assert!(receipt.completion.is_cover());
            assert_eq!(stats.total_covers, 1);
        }

        it "returns None for a missing chore and logs nothing" {
            let result = db.record_completion(42, "Bob", date("2024-01-08")).expect("Completion failed");
            assert!(result.is_none());
            assert!(db.get_history(&HistoryFilter::All, date("2024-01-08"), 50).expect("Query failed").is_empty());
        }

        it "keeps completions after the chore is removed" {
            let chore = create_test_chore(&db, "dishes", "Alice");
            db.record_completion(chore.id, "Alice", date("2024-01-08")).expect("Completion failed");
            db.delete_chore(chore.id).expect("Delete failed");

            let history = db.get_history(&HistoryFilter::All, date("2024-01-08"), 50).expect("Query failed");
            assert_eq!(history.len(), 1);
            assert_eq!(history[0].chore_name, "dishes");
        }
    }

    describe "sessions" {
        it "saves, updates and clears a wizard session" {
            let mut session = Session::start(-100, 7);
            db.save_session(&session).expect("Save failed");

            session.step = WizardStep::AskAssignee;
            session.draft.name = Some("mopping".to_string());
            db.save_session(&session).expect("Save failed");

            let found = db.get_session(-100, 7).expect("Query failed").expect("Session missing");
            assert_eq!(found, session);

            assert!(db.clear_session(-100, 7).expect("Clear failed"));
            assert!(db.get_session(-100, 7).expect("Query failed").is_none());
        }

        it "keeps sessions per user" {
            db.save_session(&Session::start(-100, 1)).expect("Save failed");
            assert!(db.get_session(-100, 2).expect("Query failed").is_none());
        }

        it "finish_wizard creates the chore and drops the session" {
            db.save_session(&Session::start(-100, 7)).expect("Save failed");

            let chore = db.finish_wizard(-100, 7, CreateChoreInput {
                name: "bins".to_string(),
                category: None,
                mode: AssignMode::Fixed,
                assignee: "Bob".to_string(),
                interval_days: 7,
                start_date: None,
                time: NaiveTime::from_hms_opt(20, 0, 0).expect("Invalid time"),
            }).expect("Finish failed");

            assert_eq!(chore.name, "bins");
            assert_eq!(chore.category_or_default(), Category::Admin);
            assert!(db.get_session(-100, 7).expect("Query failed").is_none());
        }
    }

    describe "reports" {
        before {
            let dishes = create_test_chore(&db, "dishes", "Alice");
            let bins = create_test_chore(&db, "bins", "Bob");
            db.record_completion(dishes.id, "Alice", date("2024-01-01")).expect("Completion failed");
            db.record_completion(dishes.id, "Bob", date("2024-01-09")).expect("Completion failed");
            db.record_completion(bins.id, "Bob", date("2024-01-10")).expect("Completion failed");
        }

        it "lists history newest first" {
            let history = db.get_history(&HistoryFilter::All, date("2024-01-10"), 50).expect("Query failed");
            let on: Vec<NaiveDate> = history.iter().map(|c| c.completed_on).collect();
            assert_eq!(on, vec![date("2024-01-10"), date("2024-01-09"), date("2024-01-01")]);
        }

        it "limits history" {
            let history = db.get_history(&HistoryFilter::All, date("2024-01-10"), 2).expect("Query failed");
            assert_eq!(history.len(), 2);
        }

        it "filters history by recent days" {
            let history = db.get_history(&HistoryFilter::SinceDays(3), date("2024-01-10"), 50).expect("Query failed");
            assert_eq!(history.len(), 2);
        }

        it "filters history by case-insensitive substring" {
            let by_name = db.get_history(&HistoryFilter::Matching("DISH".to_string()), date("2024-01-10"), 50).expect("Query failed");
            assert_eq!(by_name.len(), 2);

            let by_assignee = db.get_history(&HistoryFilter::Matching("alice".to_string()), date("2024-01-10"), 50).expect("Query failed");
            assert_eq!(by_assignee.len(), 2);
        }

        it "summarises a recent window with covers" {
            let summary = db.get_summary(7, date("2024-01-10")).expect("Query failed");
            assert_eq!(summary.by_completer, vec![PersonCount { person: "Bob".to_string(), count: 2 }]);
            assert_eq!(summary.covers, vec![CoverCount {
                assigned_to: "Alice".to_string(),
                completed_by: "Bob".to_string(),
                count: 1,
            }]);
        }

        it "computes lifetime stats" {
            let stats = db.get_lifetime_stats().expect("Query failed");
            assert_eq!(stats.by_completer, vec![
                PersonCount { person: "Bob".to_string(), count: 2 },
                PersonCount { person: "Alice".to_string(), count: 1 },
            ]);
            assert_eq!(stats.by_assignee, vec![
                PersonCount { person: "Alice".to_string(), count: 2 },
                PersonCount { person: "Bob".to_string(), count: 1 },
            ]);
            assert_eq!(stats.total_covers, 1);
        }
    }

    describe "file-backed store" {
        it "persists across reopen" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = dir.path().join("nested").join("chores.db");

            {
                let file_db = Database::open(path.clone()).expect("Failed to open");
                file_db.migrate().expect("Failed to migrate");
                file_db.set_people("Alice", "Bob").expect("Failed to set people");
                create_test_chore(&file_db, "dishes", "Alice");
            }

            let reopened = Database::open(path).expect("Failed to reopen");
            reopened.migrate().expect("Failed to migrate again");
            assert_eq!(reopened.list_chores().expect("Query failed").len(), 1);
            assert_eq!(reopened.get_household().expect("Query failed").person1.as_deref(), Some("Alice"));
        }
    }
}

mod common;

#[cfg(test)]
mod tests {
    use futures_util::future::join_all;
    use uuid::Uuid;

    use pronet_api::database::DatabaseService;
    use pronet_api::models::{
        ApplyRequest, CommentRequest, ConnectionStatus, ExperienceRequest, JobType, NewJob, ProfileFields, User,
    };

    use crate::common::{live_db, TestState};

    // Helper to set up state (requires running DB)
    async fn setup() -> Option<TestState> {
        live_db().await.map(|db| TestState::new(db, 10_000))
    }

    async fn create_user(db: &DatabaseService, name: &str) -> User {
        let email = format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4());
        db.create_user(name, &email, "unused-hash", None).await.unwrap()
    }

    async fn create_users(db: &DatabaseService, count: usize) -> Vec<User> {
        let mut users = Vec::with_capacity(count);
        for i in 0..count {
            users.push(create_user(db, &format!("Member{}", i)).await);
        }
        users
    }

    #[actix_rt::test]
    async fn test_concurrent_likes_and_comments_are_all_kept() {
        let state = match setup().await {
            Some(s) => s,
            None => {
                println!("Skipping test_concurrent_likes_and_comments_are_all_kept: DATABASE_URL not set or DB unreachable");
                return;
            }
        };

        let author = create_user(&state.db, "Author").await;
        let post = state.db.create_post(&author.id, "Busy post").await.unwrap();
        let likers = create_users(&state.db, 20).await;

        let results = join_all(likers.iter().map(|u| state.posts.like_post(u.id, post.id))).await;
        assert!(results.iter().all(|r| r.is_ok()));

        let results = join_all(likers.iter().take(10).map(|u| {
            let req = CommentRequest { text: Some(format!("hello from {}", u.name)) };
            state.posts.add_comment(u, post.id, req)
        }))
        .await;
        assert!(results.iter().all(|r| r.is_ok()));

        let stored = state.db.get_post(&post.id).await.unwrap().unwrap();
        assert_eq!(stored.likes.len(), 20);
        assert_eq!(stored.comments.len(), 10);
    }

    #[actix_rt::test]
    async fn test_concurrent_double_like_is_rejected_once() {
        let state = match setup().await {
            Some(s) => s,
            None => {
                println!("Skipping test_concurrent_double_like_is_rejected_once: DATABASE_URL not set or DB unreachable");
                return;
            }
        };

        let author = create_user(&state.db, "Author").await;
        let fan = create_user(&state.db, "Fan").await;
        let post = state.db.create_post(&author.id, "Like me once").await.unwrap();

        let (first, second) = tokio::join!(
            state.posts.like_post(fan.id, post.id),
            state.posts.like_post(fan.id, post.id)
        );
        let errors: Vec<_> = [first, second].into_iter().filter_map(Result::err).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Post already liked");

        let stored = state.db.get_post(&post.id).await.unwrap().unwrap();
        assert_eq!(stored.likes.len(), 1);
    }

    #[actix_rt::test]
    async fn test_concurrent_applications_are_all_kept() {
        let state = match setup().await {
            Some(s) => s,
            None => {
                println!("Skipping test_concurrent_applications_are_all_kept: DATABASE_URL not set or DB unreachable");
                return;
            }
        };

        let poster = create_user(&state.db, "Poster").await;
        let new_job = NewJob {
            company: "Initech".to_string(),
            title: "Engineer".to_string(),
            description: "APIs".to_string(),
            location: "Remote".to_string(),
            job_type: JobType::FullTime,
        };
        let job = state.db.create_job(&poster.id, &new_job).await.unwrap();
        let seekers = create_users(&state.db, 15).await;

        let results = join_all(
            seekers
                .iter()
                .map(|u| state.jobs.apply_for_job(u.id, job.id, ApplyRequest::default())),
        )
        .await;
        assert!(results.iter().all(|r| r.is_ok()));

        let stored = state.db.get_job(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.applicants.len(), 15);
    }

    #[actix_rt::test]
    async fn test_concurrent_experience_entries_are_all_kept() {
        let state = match setup().await {
            Some(s) => s,
            None => {
                println!("Skipping test_concurrent_experience_entries_are_all_kept: DATABASE_URL not set or DB unreachable");
                return;
            }
        };

        let user = create_user(&state.db, "Busy").await;
        state.db.upsert_profile(&user.id, &ProfileFields::default()).await.unwrap();

        let results = join_all((0..8).map(|i| {
            let req = ExperienceRequest {
                title: Some(format!("Role {}", i)),
                company: Some("Initech".to_string()),
                from: chrono::NaiveDate::from_ymd_opt(2020, 1, 1),
                ..Default::default()
            };
            state.profiles.add_experience(user.id, req)
        }))
        .await;
        assert!(results.iter().all(|r| r.is_ok()));

        let stored = state.db.get_profile_by_user(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.profile.experience.len(), 8);
    }

    #[actix_rt::test]
    async fn test_stale_decline_cannot_override_accept() {
        let state = match setup().await {
            Some(s) => s,
            None => {
                println!("Skipping test_stale_decline_cannot_override_accept: DATABASE_URL not set or DB unreachable");
                return;
            }
        };

        let alice = create_user(&state.db, "Alice").await;
        let bob = create_user(&state.db, "Bob").await;
        let request = state.connections.send_request(alice.id, bob.id).await.unwrap().data.unwrap();

        // Read while pending, then accepted by another request
        let stale = state.db.get_connection(&request.id).await.unwrap().unwrap();
        state.connections.accept_request(bob.id, request.id).await.unwrap();

        let err = state.db.decline_connection(&stale).await.unwrap_err();
        assert_eq!(err.status_code, 400);
        assert_eq!(err.message, "Request is not pending");

        let stored = state.db.get_connection(&request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ConnectionStatus::Accepted);

        // Removal clears the pair, so a fresh request goes through
        state.connections.remove_connection(alice.id, bob.id).await.unwrap();
        assert!(state.connections.send_request(bob.id, alice.id).await.is_ok());
    }

    #[actix_rt::test]
    async fn test_racing_accept_and_decline_settle_consistently() {
        let state = match setup().await {
            Some(s) => s,
            None => {
                println!("Skipping test_racing_accept_and_decline_settle_consistently: DATABASE_URL not set or DB unreachable");
                return;
            }
        };

        for _ in 0..10 {
            let a = create_user(&state.db, "Requester").await;
            let b = create_user(&state.db, "Recipient").await;
            let request = state.connections.send_request(a.id, b.id).await.unwrap().data.unwrap();

            let (accepted, declined) = tokio::join!(
                state.connections.accept_request(b.id, request.id),
                state.connections.decline_request(b.id, request.id)
            );
            assert!(accepted.is_ok() != declined.is_ok(), "exactly one of accept/decline must win");

            let stored = state.db.get_connection(&request.id).await.unwrap().unwrap();
            let a_now = state.db.get_user_by_id(&a.id).await.unwrap().unwrap();
            let b_now = state.db.get_user_by_id(&b.id).await.unwrap().unwrap();

            if accepted.is_ok() {
                assert_eq!(stored.status, ConnectionStatus::Accepted);
                assert_eq!(a_now.connections, vec![b.id]);
                assert_eq!(b_now.connections, vec![a.id]);
            } else {
                assert_eq!(stored.status, ConnectionStatus::Declined);
                assert!(a_now.connections.is_empty());
                assert!(b_now.connections.is_empty());
            }
        }
    }
}

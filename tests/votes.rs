use bordit::backend::{FieldUpdate, WriteOp};
use bordit::models::models::{Post, PostVote};
use bordit::votes::{reconcile_vote, Vote, VoteAction};

fn post(vote_status: i64) -> Post {
    Post {
        id: "p1".to_string(),
        community_id: "rust".to_string(),
        community_image_url: String::new(),
        creator_id: "uid-author".to_string(),
        creator_display_name: "author".to_string(),
        title: "Hello".to_string(),
        body: String::new(),
        image_url: None,
        number_of_comments: 0,
        vote_status,
        created_at: "2024-01-01T00:00:00+00:00".to_string(),
    }
}

fn vote(value: i64) -> PostVote {
    PostVote {
        id: "v1".to_string(),
        post_id: "p1".to_string(),
        community_id: "rust".to_string(),
        vote_value: value,
    }
}

#[test]
fn test_first_vote_inserts_record() {
    let outcome = reconcile_vote(&post(4), &[], Vote::Down, || "new".to_string());

    assert_eq!(outcome.delta, -1);
    assert_eq!(outcome.vote_status, 3);
    assert_eq!(outcome.votes.len(), 1);
    assert_eq!(outcome.votes[0].id, "new");
    assert_eq!(outcome.votes[0].vote_value, -1);
    assert!(matches!(outcome.action, VoteAction::Insert(_)));
}

#[test]
fn test_reclick_removes_record_and_restores_status() {
    let outcome = reconcile_vote(&post(5), &[vote(1)], Vote::Up, || unreachable!());

    assert_eq!(outcome.delta, -1);
    assert_eq!(outcome.vote_status, 4);
    assert!(outcome.votes.is_empty());
    assert!(outcome.record().is_none());
    assert_eq!(outcome.previous(), Some(&vote(1)));
}

#[test]
fn test_flip_changes_status_by_twice_the_new_value() {
    let up = reconcile_vote(&post(0), &[vote(-1)], Vote::Up, || unreachable!());
    assert_eq!(up.delta, 2);
    assert_eq!(up.vote_status, 2);
    assert_eq!(up.votes, vec![vote(1)]);

    let down = reconcile_vote(&post(0), &[vote(1)], Vote::Down, || unreachable!());
    assert_eq!(down.delta, -2);
    assert_eq!(down.votes, vec![vote(-1)]);
}

#[test]
fn test_votes_on_other_posts_are_untouched() {
    let other = PostVote {
        id: "v9".to_string(),
        post_id: "p9".to_string(),
        community_id: "rust".to_string(),
        vote_value: -1,
    };
    let outcome = reconcile_vote(&post(0), &[other.clone()], Vote::Up, || "v2".to_string());

    assert_eq!(outcome.votes.len(), 2);
    assert!(outcome.votes.contains(&other));
}

#[test]
fn test_click_sequence_keeps_at_most_one_record() {
    let clicks = [
        Vote::Up, Vote::Up, Vote::Down, Vote::Up, Vote::Down, Vote::Down, Vote::Down, Vote::Up,
    ];
    let mut current = post(7);
    let mut votes: Vec<PostVote> = Vec::new();
    let mut expected = 7;
    let mut counter = 0;

    for click in clicks {
        let existing = votes.iter().find(|v| v.post_id == current.id).map(|v| v.vote_value);
        let value = click.value();
        expected += match existing {
            None => value,
            Some(v) if v == value => -value,
            Some(_) => 2 * value,
        };

        let outcome = reconcile_vote(&current, &votes, click, || {
            counter += 1;
            format!("v{}", counter)
        });
        current.vote_status = outcome.vote_status;
        votes = outcome.votes;

        assert!(votes.len() <= 1, "more than one vote record: {:?}", votes);
        assert_eq!(current.vote_status, expected);
    }
}

#[test]
fn test_batch_holds_record_write_and_increment() {
    let outcome = reconcile_vote(&post(0), &[vote(-1)], Vote::Up, || unreachable!());
    let batch = outcome.to_batch("uid-alice", "p1").unwrap();
    let ops = batch.ops();

    assert_eq!(ops.len(), 2);
    match &ops[0] {
        WriteOp::Update { path, fields } => {
            assert_eq!(path.collection, "users/uid-alice/postVotes");
            assert_eq!(path.id, "v1");
            assert_eq!(fields[0], ("voteValue".to_string(), FieldUpdate::Set(1.into())));
        }
        other => panic!("unexpected op {:?}", other),
    }
    match &ops[1] {
        WriteOp::Update { path, fields } => {
            assert_eq!(path.collection, "posts");
            assert_eq!(fields[0], ("voteStatus".to_string(), FieldUpdate::Increment(2)));
        }
        other => panic!("unexpected op {:?}", other),
    }
}

#[test]
fn test_vote_value_conversion() {
    assert_eq!(Vote::try_from(1i64), Ok(Vote::Up));
    assert_eq!(Vote::try_from(-1i64), Ok(Vote::Down));
    assert_eq!(Vote::try_from(0i64), Err(0));
}

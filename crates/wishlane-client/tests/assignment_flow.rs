mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{drain, wait_until, Harness};
use wishlane_client::{
    ClientConfig, ClientError, InteractionMode, NoticeKind, Selection, TapOutcome,
};
use wishlane_shared::{EventId, GiftId, OwnerId};
use wishlane_store::{EventDeletePolicy, EventItem, EventPatch, Gift, GiftPatch, NewEvent, NewGift};

fn alice() -> OwnerId {
    OwnerId::new("alice")
}

#[tokio::test]
async fn tapping_the_same_gift_twice_deselects_without_writing() {
    let h = Harness::new();
    let gift = h.store.create_gift(&alice(), NewGift::named("Lamp")).await.unwrap();
    let (mut screen, _rx) = h.mount(&alice(), InteractionMode::TapToSelect);
    let writes = h.documents.writes();

    assert_eq!(screen.tap_gift(gift.id), Selection::Armed(gift.id));
    assert_eq!(screen.tap_gift(gift.id), Selection::Idle);
    assert_eq!(h.documents.writes(), writes);
}

#[tokio::test]
async fn tapping_another_gift_rearms() {
    let h = Harness::new();
    let g1 = h.store.create_gift(&alice(), NewGift::named("g1")).await.unwrap();
    let g2 = h.store.create_gift(&alice(), NewGift::named("g2")).await.unwrap();
    let e1 = h.store.create_event(&alice(), NewEvent::named("e1")).await.unwrap();
    let (mut screen, _rx) = h.mount(&alice(), InteractionMode::TapToSelect);

    screen.tap_gift(g1.id);
    assert_eq!(screen.tap_gift(g2.id), Selection::Armed(g2.id));

    screen.tap_event(e1.id).await.unwrap();
    let g1_now = h.store.get_gift(&alice(), g1.id).await.unwrap().unwrap();
    let g2_now = h.store.get_gift(&alice(), g2.id).await.unwrap().unwrap();
    assert_eq!(g1_now.event_id, None);
    assert_eq!(g2_now.event_id, Some(e1.id));
}

#[tokio::test]
async fn tapping_an_event_with_nothing_armed_prompts_once() {
    let h = Harness::new();
    let event = h.store.create_event(&alice(), NewEvent::named("Birthday")).await.unwrap();
    let (mut screen, mut rx) = h.mount(&alice(), InteractionMode::TapToSelect);
    let writes = h.documents.writes();

    let outcome = screen.tap_event(event.id).await.unwrap();

    assert_eq!(outcome, TapOutcome::PromptedSelectGift);
    assert_eq!(h.documents.writes(), writes);
    let notices = drain(&mut rx);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::Prompt);
    assert_eq!(notices[0].title, "Select a gift first");
}

#[tokio::test]
async fn lamp_assigned_to_birthday_shows_in_fresh_snapshot() {
    let h = Harness::new();
    let lamp = h.store.create_gift(&alice(), NewGift::named("Lamp")).await.unwrap();
    assert_eq!(lamp.event_id, None);
    let birthday = h.store.create_event(&alice(), NewEvent::named("Birthday")).await.unwrap();

    h.store
        .assign_gift_to_event(&alice(), lamp.id, Some(birthday.id))
        .await
        .unwrap();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Vec<Gift>>();
    let sub = h.store.subscribe_to_gifts(&alice(), move |snapshot| {
        let _ = tx.send(snapshot);
    });
    let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    sub.unsubscribe();

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, lamp.id);
    assert_eq!(snapshot[0].event_id, Some(birthday.id));
    assert_eq!(snapshot[0].owner_id, birthday.owner_id);
}

#[tokio::test]
async fn selection_is_spent_by_the_first_assignment() {
    let h = Harness::new();
    let g1 = h.store.create_gift(&alice(), NewGift::named("g1")).await.unwrap();
    let e1 = h.store.create_event(&alice(), NewEvent::named("e1")).await.unwrap();
    let e2 = h.store.create_event(&alice(), NewEvent::named("e2")).await.unwrap();
    let (mut screen, mut rx) = h.mount(&alice(), InteractionMode::TapToSelect);

    screen.tap_gift(g1.id);
    assert_eq!(
        screen.tap_event(e1.id).await.unwrap(),
        TapOutcome::Assigned {
            gift_id: g1.id,
            event_id: e1.id
        }
    );
    assert_eq!(screen.selection(), Selection::Idle);

    let writes = h.documents.writes();
    assert_eq!(
        screen.tap_event(e2.id).await.unwrap(),
        TapOutcome::PromptedSelectGift
    );
    assert_eq!(h.documents.writes(), writes);
    assert_eq!(drain(&mut rx).len(), 1);

    let g1_now = h.store.get_gift(&alice(), g1.id).await.unwrap().unwrap();
    assert_eq!(g1_now.event_id, Some(e1.id));
}

#[tokio::test]
async fn unassign_and_repeat_assignment() {
    let h = Harness::new();
    let g1 = h.store.create_gift(&alice(), NewGift::named("g1")).await.unwrap();
    let e1 = h.store.create_event(&alice(), NewEvent::named("e1")).await.unwrap();

    h.store.assign_gift_to_event(&alice(), g1.id, Some(e1.id)).await.unwrap();
    let once = h.store.get_gifts(&alice()).await.unwrap();
    h.store.assign_gift_to_event(&alice(), g1.id, Some(e1.id)).await.unwrap();
    let twice = h.store.get_gifts(&alice()).await.unwrap();
    assert_eq!(once, twice);

    h.store.assign_gift_to_event(&alice(), g1.id, None).await.unwrap();
    let gifts = h.store.get_gifts(&alice()).await.unwrap();
    assert_eq!(gifts[0].event_id, None);
}

#[tokio::test]
async fn assignment_keeps_other_fields() {
    let h = Harness::new();
    let g1 = h.store.create_gift(&alice(), NewGift::named("Lamp")).await.unwrap();
    let e1 = h.store.create_event(&alice(), NewEvent::named("Birthday")).await.unwrap();

    h.store
        .update_gift(
            &alice(),
            g1.id,
            GiftPatch {
                description: Some("brass".into()),
                price: Some("70€".into()),
                ..GiftPatch::default()
            },
        )
        .await
        .unwrap();
    h.store.assign_gift_to_event(&alice(), g1.id, Some(e1.id)).await.unwrap();
    h.store
        .update_gift(
            &alice(),
            g1.id,
            GiftPatch {
                name: Some("Desk lamp".into()),
                ..GiftPatch::default()
            },
        )
        .await
        .unwrap();

    let gift = h.store.get_gift(&alice(), g1.id).await.unwrap().unwrap();
    assert_eq!(gift.name, "Desk lamp");
    assert_eq!(gift.description, "brass");
    assert_eq!(gift.price, "70€");
    assert_eq!(gift.event_id, Some(e1.id));
}

#[tokio::test]
async fn live_lists_are_newest_first() {
    let h = Harness::new();
    let (screen, _rx) = h.mount(&alice(), InteractionMode::TapToSelect);

    let g1 = h.store.create_gift(&alice(), NewGift::named("g1")).await.unwrap();
    let g2 = h.store.create_gift(&alice(), NewGift::named("g2")).await.unwrap();
    assert!(g1.created_at < g2.created_at);

    wait_until(|| screen.gifts().len() == 2).await;
    let ids: Vec<GiftId> = screen.gifts().iter().map(|g| g.id).collect();
    assert_eq!(ids, vec![g2.id, g1.id]);
}

#[tokio::test]
async fn lists_only_show_the_owners_records() {
    let h = Harness::new();
    let bob = OwnerId::new("bob");
    h.store.create_gift(&bob, NewGift::named("Bob's")).await.unwrap();
    let mine = h.store.create_gift(&alice(), NewGift::named("Mine")).await.unwrap();

    let (screen, _rx) = h.mount(&alice(), InteractionMode::TapToSelect);
    wait_until(|| !screen.gifts().is_empty()).await;

    let gifts = screen.gifts();
    assert_eq!(gifts.len(), 1);
    assert_eq!(gifts[0].id, mine.id);
}

#[tokio::test]
async fn assigning_to_another_owners_event_is_refused() {
    let h = Harness::new();
    let bob = OwnerId::new("bob");
    let gift = h.store.create_gift(&alice(), NewGift::named("Lamp")).await.unwrap();
    let foreign = h.store.create_event(&bob, NewEvent::named("Bob's party")).await.unwrap();
    let (mut screen, mut rx) = h.mount(&alice(), InteractionMode::TapToSelect);

    screen.tap_gift(gift.id);
    let err = screen.tap_event(foreign.id).await.unwrap_err();

    assert!(matches!(err, ClientError::Permission(_)));
    assert_eq!(drain(&mut rx)[0].kind, NoticeKind::Error);
    let stored = h.store.get_gift(&alice(), gift.id).await.unwrap().unwrap();
    assert_eq!(stored.event_id, None);

    // every assigned gift points at an event of the same owner
    let events = h.store.get_events(&alice()).await.unwrap();
    for g in h.store.get_gifts(&alice()).await.unwrap() {
        if let Some(event_id) = g.event_id {
            assert!(events.iter().any(|e| e.id == event_id && e.owner_id == g.owner_id));
        }
    }
}

#[tokio::test]
async fn vanished_gift_clears_selection() {
    let h = Harness::new();
    let event = h.store.create_event(&alice(), NewEvent::named("Birthday")).await.unwrap();
    let gift = h.store.create_gift(&alice(), NewGift::named("Lamp")).await.unwrap();
    let (mut screen, mut rx) = h.mount(&alice(), InteractionMode::TapToSelect);

    screen.tap_gift(gift.id);
    h.store.delete_gift(&alice(), gift.id).await.unwrap();

    let err = screen.tap_event(event.id).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
    assert_eq!(screen.selection(), Selection::Idle);

    let notices = drain(&mut rx);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "No longer available");
}

#[tokio::test]
async fn failed_write_leaves_lists_and_selection() {
    let h = Harness::new();
    let gift = h.store.create_gift(&alice(), NewGift::named("Lamp")).await.unwrap();
    let event = h.store.create_event(&alice(), NewEvent::named("Birthday")).await.unwrap();
    let (mut screen, mut rx) = h.mount(&alice(), InteractionMode::TapToSelect);
    wait_until(|| screen.gifts().len() == 1 && screen.events().len() == 1).await;
    let before = screen.gifts();

    h.documents.fail_writes(true);
    screen.tap_gift(gift.id);
    let err = screen.tap_event(event.id).await.unwrap_err();

    assert!(matches!(err, ClientError::Write(_)));
    assert_eq!(screen.selection(), Selection::Armed(gift.id));
    assert_eq!(screen.gifts(), before);
    assert_eq!(drain(&mut rx)[0].title, "Could not save");

    h.documents.fail_writes(false);
    screen.tap_event(event.id).await.unwrap();
    wait_until(|| screen.gift_event(gift.id).is_some()).await;
    assert_eq!(screen.gift_event(gift.id).unwrap().id, event.id);
}

#[tokio::test]
async fn empty_names_are_rejected_before_writing() {
    let h = Harness::new();
    let writes = h.documents.writes();
    let err = h.store.create_gift(&alice(), NewGift::named("   ")).await.unwrap_err();
    assert!(matches!(err, ClientError::Invalid(_)));
    assert_eq!(h.documents.writes(), writes);
}

#[tokio::test]
async fn unsubscribe_stops_callbacks_and_is_idempotent() {
    let h = Harness::new();
    let deliveries = Arc::new(Mutex::new(0usize));
    let counter = deliveries.clone();
    let sub = h.store.subscribe_to_events(&alice(), move |_| {
        *counter.lock().unwrap() += 1;
    });

    wait_until(|| *deliveries.lock().unwrap() == 1).await;
    h.store.create_event(&alice(), NewEvent::named("e1")).await.unwrap();
    wait_until(|| *deliveries.lock().unwrap() == 2).await;

    sub.unsubscribe();
    sub.unsubscribe();
    assert!(!sub.is_active());

    h.store.create_event(&alice(), NewEvent::named("e2")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(*deliveries.lock().unwrap(), 2);
}

#[tokio::test]
async fn unmounted_screen_stops_following_the_store() {
    let h = Harness::new();
    let (mut screen, _rx) = h.mount(&alice(), InteractionMode::TapToSelect);
    h.store.create_gift(&alice(), NewGift::named("g1")).await.unwrap();
    wait_until(|| screen.gifts().len() == 1).await;

    screen.unmount();
    assert!(!screen.is_mounted());
    screen.unmount();

    h.store.create_gift(&alice(), NewGift::named("g2")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(screen.gifts().len(), 1);
}

#[tokio::test]
async fn deleting_an_event_clears_assignments_by_default() {
    let h = Harness::new();
    let gift = h.store.create_gift(&alice(), NewGift::named("Lamp")).await.unwrap();
    let event = h.store.create_event(&alice(), NewEvent::named("Birthday")).await.unwrap();
    h.store.assign_gift_to_event(&alice(), gift.id, Some(event.id)).await.unwrap();

    let outcome = h.store.delete_event(&alice(), event.id).await.unwrap();
    assert!(outcome.deleted);
    assert_eq!(outcome.cleared_gifts, 1);

    let gift = h.store.get_gift(&alice(), gift.id).await.unwrap().unwrap();
    assert_eq!(gift.event_id, None);
}

#[tokio::test]
async fn keep_policy_leaves_dangling_references() {
    let h = Harness::with_config(ClientConfig {
        event_delete_policy: EventDeletePolicy::KeepReferences,
        ..ClientConfig::default()
    });
    let gift = h.store.create_gift(&alice(), NewGift::named("Lamp")).await.unwrap();
    let event = h.store.create_event(&alice(), NewEvent::named("Birthday")).await.unwrap();
    h.store.assign_gift_to_event(&alice(), gift.id, Some(event.id)).await.unwrap();

    let outcome = h.store.delete_event(&alice(), event.id).await.unwrap();
    assert_eq!(outcome.cleared_gifts, 0);

    let gift = h.store.get_gift(&alice(), gift.id).await.unwrap().unwrap();
    assert_eq!(gift.event_id, Some(event.id));
    assert!(h.store.get_event(&alice(), event.id).await.unwrap().is_none());

    // a dangling event can no longer be targeted
    let err = h
        .store
        .assign_gift_to_event(&alice(), gift.id, Some(event.id))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
}

#[tokio::test]
async fn drag_needs_drag_mode() {
    let h = Harness::new();
    let gift = h.store.create_gift(&alice(), NewGift::named("Lamp")).await.unwrap();
    let (screen, _rx) = h.mount(&alice(), InteractionMode::TapToSelect);
    wait_until(|| screen.gifts().len() == 1).await;

    assert_eq!(screen.start_drag(gift.id), None);
}

#[tokio::test]
async fn drag_and_tap_reach_the_same_state() {
    let h = Harness::new();
    let dragged = h.store.create_gift(&alice(), NewGift::named("dragged")).await.unwrap();
    let tapped = h.store.create_gift(&alice(), NewGift::named("tapped")).await.unwrap();
    let event = h.store.create_event(&alice(), NewEvent::named("Birthday")).await.unwrap();

    let (mut screen, mut rx) = h.mount(&alice(), InteractionMode::DragAndDrop);
    wait_until(|| screen.gifts().len() == 2).await;

    assert_eq!(screen.start_drag(GiftId::new()), None);
    let payload = screen.start_drag(dragged.id).unwrap();
    screen.drop_on_event(payload, event.id).await.unwrap();
    assert_eq!(screen.selection(), Selection::Idle);

    screen.tap_gift(tapped.id);
    screen.tap_event(event.id).await.unwrap();

    wait_until(|| screen.gifts().iter().all(|g| g.event_id == Some(event.id))).await;
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn sample_action_creates_a_gift_and_an_event() {
    let h = Harness::new();
    let (screen, _rx) = h.mount(&alice(), InteractionMode::TapToSelect);

    let (gift, event) = screen.add_sample().await.unwrap();
    assert!(gift.name.starts_with("Gift "));
    assert!(event.name.starts_with("Event "));

    wait_until(|| screen.gifts().len() == 1 && screen.events().len() == 1).await;
}

#[tokio::test]
async fn deleting_the_armed_gift_disarms() {
    let h = Harness::new();
    let gift = h.store.create_gift(&alice(), NewGift::named("Lamp")).await.unwrap();
    let (mut screen, _rx) = h.mount(&alice(), InteractionMode::TapToSelect);

    screen.tap_gift(gift.id);
    assert!(screen.delete_gift(gift.id).await.unwrap());
    assert_eq!(screen.selection(), Selection::Idle);
    assert!(!screen.delete_gift(gift.id).await.unwrap());
}

#[tokio::test]
async fn signed_out_screen_uses_demo_owner() {
    let h = Harness::new();
    assert!(h.ctx.owner_id().is_demo());

    let mut screen = wishlane_client::AssignmentController::mount_for_context(
        h.ctx.clone(),
        Arc::new(wishlane_client::LogNotices),
    );
    assert!(screen.owner().is_demo());
    assert_eq!(screen.mode(), InteractionMode::TapToSelect);
    screen.unmount();
}

#[tokio::test]
async fn event_deleted_as_assignment_starts_is_not_found() {
    let h = Harness::new();
    let gift = h.store.create_gift(&alice(), NewGift::named("Lamp")).await.unwrap();
    let event = h.store.create_event(&alice(), NewEvent::named("Birthday")).await.unwrap();
    let (mut screen, mut rx) = h.mount(&alice(), InteractionMode::TapToSelect);

    h.documents.delete_target_before_assign(true);
    screen.tap_gift(gift.id);
    let err = screen.tap_event(event.id).await.unwrap_err();

    assert!(matches!(err, ClientError::NotFound(_)));
    assert_eq!(screen.selection(), Selection::Idle);
    assert_eq!(drain(&mut rx)[0].title, "No longer available");
    assert!(h.store.get_event(&alice(), event.id).await.unwrap().is_none());
    let stored = h.store.get_gift(&alice(), gift.id).await.unwrap().unwrap();
    assert_eq!(stored.event_id, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_assign_and_delete_leave_no_dangling_event() {
    let h = Harness::new();

    for _ in 0..25 {
        let gift = h.store.create_gift(&alice(), NewGift::named("Lamp")).await.unwrap();
        let event = h.store.create_event(&alice(), NewEvent::named("Birthday")).await.unwrap();

        let owner = alice();
        let (assigned, deleted) = tokio::join!(
            h.store.assign_gift_to_event(&owner, gift.id, Some(event.id)),
            h.store.delete_event(&owner, event.id),
        );
        assert!(deleted.unwrap().deleted);
        match assigned {
            Ok(()) | Err(ClientError::NotFound(_)) => {}
            Err(e) => panic!("unexpected {e}"),
        }

        let stored = h.store.get_gift(&alice(), gift.id).await.unwrap().unwrap();
        assert_eq!(stored.event_id, None);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unsubscribe_waits_for_a_running_callback() {
    let h = Harness::new();
    let started = Arc::new(AtomicBool::new(false));
    let finished = Arc::new(AtomicBool::new(false));
    let (s, f) = (started.clone(), finished.clone());
    let sub = h.store.subscribe_to_gifts(&alice(), move |_| {
        s.store(true, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(200));
        f.store(true, Ordering::SeqCst);
    });

    wait_until(|| started.load(Ordering::SeqCst)).await;
    sub.unsubscribe();
    assert!(finished.load(Ordering::SeqCst));
}

#[tokio::test]
async fn events_are_newest_first() {
    let h = Harness::new();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Vec<EventItem>>();
    let sub = h.store.subscribe_to_events(&alice(), move |snapshot| {
        let _ = tx.send(snapshot);
    });

    let e1 = h.store.create_event(&alice(), NewEvent::named("e1")).await.unwrap();
    let e2 = h.store.create_event(&alice(), NewEvent::named("e2")).await.unwrap();
    let e3 = h.store.create_event(&alice(), NewEvent::named("e3")).await.unwrap();
    let expected = vec![e3.id, e2.id, e1.id];

    let listed: Vec<EventId> = h
        .store
        .get_events(&alice())
        .await
        .unwrap()
        .iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(listed, expected);

    let live = loop {
        let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        if snapshot.len() == 3 {
            break snapshot;
        }
    };
    let live: Vec<EventId> = live.iter().map(|e| e.id).collect();
    assert_eq!(live, expected);
    sub.unsubscribe();
}

#[tokio::test]
async fn update_event_changes_only_named_fields() {
    let h = Harness::new();
    let event = h
        .store
        .create_event(
            &alice(),
            NewEvent {
                name: "Bday".into(),
                description: Some("at home".into()),
                ..NewEvent::default()
            },
        )
        .await
        .unwrap();

    h.store
        .update_event(
            &alice(),
            event.id,
            EventPatch {
                name: Some("  Birthday ".into()),
                ..EventPatch::default()
            },
        )
        .await
        .unwrap();
    let stored = h.store.get_event(&alice(), event.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Birthday");
    assert_eq!(stored.description, "at home");
    assert_eq!(stored.created_at, event.created_at);

    let writes = h.documents.writes();
    let err = h
        .store
        .update_event(
            &alice(),
            event.id,
            EventPatch {
                name: Some(" ".into()),
                ..EventPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Invalid(_)));
    assert_eq!(h.documents.writes(), writes);

    let err = h
        .store
        .update_event(&OwnerId::new("bob"), event.id, EventPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
}

use std::sync::mpsc;

use super::*;
use crate::detect::region::DetectionMethod;

fn drag(from: (f64, f64), to: (f64, f64)) -> [PointerEvent; 3] {
    [
        PointerEvent::Press(from.into()),
        PointerEvent::Move(((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0).into()),
        PointerEvent::Release(to.into()),
    ]
}

#[test]
fn walks_through_awaiting_states_to_complete() {
    let mut sel = RegionSelector::new(2);
    assert_eq!(sel.state(), SelectionState::Idle);

    sel.handle(PointerEvent::Press(Point::new(10.0, 10.0)));
    assert_eq!(sel.state(), SelectionState::AwaitingRegion(0));
    sel.handle(PointerEvent::Move(Point::new(30.0, 20.0)));
    assert_eq!(sel.drag_preview(), Some(Region::new(10.0, 10.0, 20.0, 10.0)));
    assert_eq!(
        sel.handle(PointerEvent::Release(Point::new(30.0, 25.0))),
        SelectionState::AwaitingRegion(1)
    );
    assert!(sel.drag_preview().is_none());

    for e in drag((50.0, 40.0), (40.0, 30.0)) {
        sel.handle(e);
    }
    assert_eq!(sel.state(), SelectionState::Complete);
    assert_eq!(
        sel.regions(),
        &[
            Region::new(10.0, 10.0, 20.0, 15.0),
            Region::new(40.0, 30.0, 10.0, 10.0)
        ]
    );
}

#[test]
fn clicks_without_drag_do_not_count() {
    let mut sel = RegionSelector::new(1);
    sel.handle(PointerEvent::Press(Point::new(5.0, 5.0)));
    sel.handle(PointerEvent::Release(Point::new(5.2, 5.0)));
    assert_eq!(sel.state(), SelectionState::AwaitingRegion(0));
    assert!(sel.regions().is_empty());

    sel.handle(PointerEvent::Move(Point::new(9.0, 9.0)));
    sel.handle(PointerEvent::Release(Point::new(9.0, 9.0)));
    assert_eq!(sel.state(), SelectionState::AwaitingRegion(0));
}

#[test]
fn cancel_is_terminal() {
    let mut sel = RegionSelector::new(3);
    for e in drag((0.0, 0.0), (10.0, 10.0)) {
        sel.handle(e);
    }
    assert_eq!(sel.handle(PointerEvent::Cancel), SelectionState::Cancelled);
    for e in drag((0.0, 0.0), (10.0, 10.0)) {
        assert_eq!(sel.handle(e), SelectionState::Cancelled);
    }
    assert_eq!(sel.into_regions(), Err(SelectionCancelled));
}

#[test]
fn zero_regions_is_already_complete() {
    let sel = RegionSelector::new(0);
    assert_eq!(sel.state(), SelectionState::Complete);
    assert_eq!(sel.into_regions(), Ok(Vec::new()));
}

#[test]
fn blocking_selection_resolves_from_another_thread() {
    let (tx, rx) = mpsc::channel();
    let producer = std::thread::spawn(move || {
        for (a, b) in [
            ((10.0, 10.0), (30.0, 20.0)),
            ((60.0, 10.0), (80.0, 20.0)),
            ((30.0, 50.0), (60.0, 65.0)),
        ] {
            for e in drag(a, b) {
                tx.send(e).unwrap();
            }
        }
    });
    let set = select_region_set_blocking(&rx).unwrap();
    producer.join().unwrap();

    assert_eq!(set.label, DetectionMethod::Manual);
    assert_eq!(set.left_eye, Region::new(10.0, 10.0, 20.0, 10.0));
    assert_eq!(set.right_eye, Region::new(60.0, 10.0, 20.0, 10.0));
    assert_eq!(set.mouth, Region::new(30.0, 50.0, 30.0, 15.0));
}

#[test]
fn blocking_selection_reports_cancel_and_disconnect() {
    let (tx, rx) = mpsc::channel();
    for e in drag((0.0, 0.0), (5.0, 5.0)) {
        tx.send(e).unwrap();
    }
    tx.send(PointerEvent::Cancel).unwrap();
    assert_eq!(select_regions_blocking(&rx, 2), Err(SelectionCancelled));

    let (tx, rx) = mpsc::channel::<PointerEvent>();
    tx.send(PointerEvent::Press(Point::new(1.0, 1.0))).unwrap();
    drop(tx);
    assert_eq!(select_regions_blocking(&rx, 1), Err(SelectionCancelled));
}

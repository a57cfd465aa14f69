use tokio::sync::mpsc;

use lockstep::error::{CoreError, ServiceError};
use lockstep::kernel::event::{AlignEpoch, Command, Completion, Event};
use lockstep::kernel::reactor::{NoticeLevel, ReactorConfig, SideEffect};
use lockstep::kernel::state::{Alignment, Provenance, Segment};
use lockstep::Reactor;

fn new_reactor() -> Reactor {
    let (_tx, rx) = mpsc::channel(16);
    Reactor::new(rx, ReactorConfig::default())
}

fn cmd(command: Command) -> Event {
    Event::Command(command)
}

fn done(completion: Completion) -> Event {
    Event::Completion(completion)
}

fn commit_audio(reactor: &mut Reactor, url: &str) {
    reactor.tick_step(vec![done(Completion::Persisted {
        provenance: Provenance::Uploaded,
        mime_type: "audio/mpeg".to_string(),
        result: Ok(url.to_string()),
    })]);
}

fn align_call(effects: &[SideEffect]) -> Option<AlignEpoch> {
    effects.iter().find_map(|e| match e {
        SideEffect::CallAlign { epoch, .. } => Some(*epoch),
        _ => None,
    })
}

fn two_segments() -> Alignment {
    Alignment {
        segments: vec![
            Segment {
                line: "ship".to_string(),
                start: 0.0,
                end: 1.2,
            },
            Segment {
                line: "sheep".to_string(),
                start: 1.4,
                end: 2.6,
            },
        ],
        raw_words: vec![],
    }
}

#[test]
fn align_requires_saved_audio() {
    let mut reactor = new_reactor();
    reactor.tick_step(vec![cmd(Command::EditText("ship".to_string()))]);

    let effects = reactor.tick_step(vec![cmd(Command::Align)]);

    assert!(align_call(&effects).is_none(), "no call without saved audio");
    assert!(effects.iter().any(|e| matches!(
        e,
        SideEffect::Notify(n) if n.level == NoticeLevel::Error && n.message == "save audio first"
    )));
}

#[test]
fn align_requires_text() {
    let mut reactor = new_reactor();
    commit_audio(&mut reactor, "a.mp3");

    let effects = reactor.tick_step(vec![cmd(Command::Align)]);

    assert!(align_call(&effects).is_none());
    assert!(effects.iter().any(|e| matches!(
        e,
        SideEffect::Notify(n) if n.message == "enter text first"
    )));
}

#[test]
fn stale_alignment_is_discarded() {
    let mut reactor = new_reactor();
    reactor.tick_step(vec![cmd(Command::EditText("ship\nsheep".to_string()))]);
    commit_audio(&mut reactor, "a.mp3");

    let effects = reactor.tick_step(vec![cmd(Command::Align)]);
    let epoch = align_call(&effects).expect("align dispatched");

    // Text changes before the response arrives.
    reactor.tick_step(vec![cmd(Command::EditText("cot\ncaught".to_string()))]);

    let effects = reactor.tick_step(vec![done(Completion::Aligned {
        epoch,
        result: Ok(two_segments()),
    })]);

    assert!(
        reactor.state.alignment().is_empty(),
        "stale result must not be applied"
    );
    assert!(
        !effects
            .iter()
            .any(|e| matches!(e, SideEffect::Notify(n) if n.level == NoticeLevel::Success)),
        "a success state from the dead request never appears"
    );
    println!("stale alignment rejected");
}

#[test]
fn alignment_for_replaced_audio_is_discarded() {
    let mut reactor = new_reactor();
    reactor.tick_step(vec![cmd(Command::EditText("ship\nsheep".to_string()))]);
    commit_audio(&mut reactor, "a.mp3");

    let effects = reactor.tick_step(vec![cmd(Command::Align)]);
    let epoch = align_call(&effects).expect("align dispatched");

    // New audio lands while the call is in flight.
    commit_audio(&mut reactor, "b.mp3");

    reactor.tick_step(vec![done(Completion::Aligned {
        epoch,
        result: Ok(two_segments()),
    })]);

    assert!(reactor.state.alignment().is_empty());
    assert_eq!(reactor.state.audio().url, "b.mp3");
}

#[test]
fn current_alignment_is_applied() {
    let mut reactor = new_reactor();
    reactor.tick_step(vec![cmd(Command::EditText("ship\nsheep".to_string()))]);
    commit_audio(&mut reactor, "a.mp3");

    let effects = reactor.tick_step(vec![cmd(Command::Align)]);
    let epoch = align_call(&effects).expect("align dispatched");

    let effects = reactor.tick_step(vec![done(Completion::Aligned {
        epoch,
        result: Ok(two_segments()),
    })]);

    assert_eq!(reactor.state.alignment().segments.len(), 2);
    assert!(effects
        .iter()
        .any(|e| matches!(e, SideEffect::Notify(n) if n.level == NoticeLevel::Success)));
}

#[test]
fn failed_alignment_keeps_existing_segments() {
    let mut reactor = new_reactor();
    reactor.tick_step(vec![cmd(Command::EditText("ship\nsheep".to_string()))]);
    commit_audio(&mut reactor, "a.mp3");

    let effects = reactor.tick_step(vec![cmd(Command::Align)]);
    let epoch = align_call(&effects).expect("align dispatched");
    reactor.tick_step(vec![done(Completion::Aligned {
        epoch,
        result: Ok(two_segments()),
    })]);
    assert_eq!(reactor.state.alignment().segments.len(), 2);

    // Regenerate fails; previous timestamps stay.
    let effects = reactor.tick_step(vec![cmd(Command::Align)]);
    let epoch = align_call(&effects).expect("align dispatched");
    let effects = reactor.tick_step(vec![done(Completion::Aligned {
        epoch,
        result: Err(CoreError::Alignment(ServiceError::Backend(
            "transcription failed".to_string(),
        ))),
    })]);

    assert_eq!(reactor.state.alignment().segments.len(), 2);
    assert!(effects
        .iter()
        .any(|e| matches!(e, SideEffect::Notify(n) if n.level == NoticeLevel::Error)));
}

#[test]
fn regenerate_fully_replaces_segments() {
    let mut reactor = new_reactor();
    reactor.tick_step(vec![cmd(Command::EditText("ship\nsheep".to_string()))]);
    commit_audio(&mut reactor, "a.mp3");

    let effects = reactor.tick_step(vec![cmd(Command::Align)]);
    let epoch = align_call(&effects).expect("align dispatched");
    reactor.tick_step(vec![done(Completion::Aligned {
        epoch,
        result: Ok(two_segments()),
    })]);

    let replacement = Alignment {
        segments: vec![Segment {
            line: "ship".to_string(),
            start: 0.5,
            end: 1.0,
        }],
        raw_words: vec![],
    };

    let effects = reactor.tick_step(vec![cmd(Command::Align)]);
    let epoch = align_call(&effects).expect("align dispatched");
    reactor.tick_step(vec![done(Completion::Aligned {
        epoch,
        result: Ok(replacement),
    })]);

    assert_eq!(reactor.state.alignment().segments.len(), 1);
    assert_eq!(reactor.state.alignment().segments[0].start, 0.5);
}

#[test]
fn hand_edit_adjusts_one_segment_without_realign() {
    let mut reactor = new_reactor();
    reactor.tick_step(vec![cmd(Command::EditText("ship\nsheep".to_string()))]);
    commit_audio(&mut reactor, "a.mp3");

    let effects = reactor.tick_step(vec![cmd(Command::Align)]);
    let epoch = align_call(&effects).expect("align dispatched");
    reactor.tick_step(vec![done(Completion::Aligned {
        epoch,
        result: Ok(two_segments()),
    })]);

    let effects = reactor.tick_step(vec![cmd(Command::EditSegment {
        index: 1,
        start: 1.5,
        end: 2.5,
    })]);

    assert!(align_call(&effects).is_none(), "no re-alignment on hand edit");
    assert_eq!(reactor.state.alignment().segments[1].start, 1.5);
    assert_eq!(reactor.state.alignment().segments[1].end, 2.5);
    assert_eq!(reactor.state.alignment().segments[0].start, 0.0);
}

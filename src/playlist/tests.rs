use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::thread;

use super::*;
use crate::error::Error;
use crate::media::{ItemArgs, MediaCache, Wrapper};
use crate::testutil::{RecordingTransport, memory_cache};

fn radios(n: usize) -> (Arc<MediaCache>, Vec<Wrapper>) {
    let cache = memory_cache(std::path::Path::new("/tmp"));
    let wrappers = (0..n)
        .map(|i| {
            let name = format!("R{i}");
            cache
                .get_or_create(
                    &ItemArgs::radio(format!("http://radio{i}.example/"), Some(name.as_str())),
                    "alice",
                )
                .unwrap()
        })
        .collect();
    (cache, wrappers)
}

fn filled(mode: PlaybackMode, transport: Arc<RecordingTransport>, items: &[Wrapper]) -> Playlist {
    let playlist = Playlist::new(mode, transport);
    playlist.extend(items.to_vec());
    playlist
}

fn titles(playlist: &Playlist) -> Vec<String> {
    playlist.entries().iter().map(Wrapper::title).collect()
}

#[test]
fn append_leaves_cursor_unset_and_idle_removal_lands_on_successor() {
    let (_cache, w) = radios(3);
    let transport = RecordingTransport::idle();
    let playlist = Playlist::new(PlaybackMode::OneShot, transport.clone());

    assert_eq!(playlist.append(w[0].clone()), 0);
    assert_eq!(playlist.append(w[1].clone()), 1);
    assert_eq!(playlist.append(w[2].clone()), 2);
    assert_eq!(playlist.current_index(), None);

    playlist.point_to(0).unwrap();
    assert_eq!(playlist.current_index(), Some(0));

    let removed = playlist.remove(0).unwrap();
    assert!(removed.ptr_eq(&w[0]));
    assert_eq!(titles(&playlist), vec!["R1", "R2"]);
    assert_eq!(playlist.current_index(), Some(0));
    assert!(playlist.current_item().unwrap().ptr_eq(&w[1]));
    assert_eq!(transport.interrupt_count(), 0);
}

#[test]
fn removing_playing_entry_parks_before_successor_and_interrupts() {
    let (_cache, w) = radios(3);
    let transport = RecordingTransport::playing();
    let playlist = filled(PlaybackMode::OneShot, transport.clone(), &w);
    playlist.point_to(1).unwrap();

    playlist.remove(1).unwrap();
    assert_eq!(playlist.current_index(), Some(0));
    assert_eq!(transport.interrupt_count(), 1);

    // The transport reports completion and lands on the successor.
    let next = playlist.advance().unwrap();
    assert!(next.ptr_eq(&w[2]));
    assert_eq!(playlist.current_index(), Some(1));
}

#[test]
fn removing_playing_first_entry_parks_at_unset_cursor() {
    let (_cache, w) = radios(3);
    let transport = RecordingTransport::playing();
    let playlist = filled(PlaybackMode::OneShot, transport.clone(), &w);
    playlist.point_to(0).unwrap();

    playlist.remove(0).unwrap();
    assert_eq!(playlist.current_index(), None);
    assert!(playlist.advance().unwrap().ptr_eq(&w[1]));
}

#[test]
fn removing_last_current_entry_decrements_by_one() {
    let (_cache, w) = radios(3);

    let transport = RecordingTransport::playing();
    let playlist = filled(PlaybackMode::OneShot, transport.clone(), &w);
    playlist.point_to(2).unwrap();
    playlist.remove(2).unwrap();
    assert_eq!(playlist.len(), 2);
    assert_eq!(playlist.current_index(), Some(1));
    assert_eq!(transport.interrupt_count(), 1);
    assert!(playlist.advance().is_none());

    let idle = RecordingTransport::idle();
    let playlist = filled(PlaybackMode::OneShot, idle.clone(), &w[..1]);
    playlist.point_to(0).unwrap();
    playlist.remove(0).unwrap();
    assert!(playlist.is_empty());
    assert_eq!(playlist.current_index(), None);
    assert_eq!(idle.interrupt_count(), 0);
}

#[test]
fn removing_around_the_cursor_keeps_it_on_the_same_entry() {
    let (_cache, w) = radios(5);
    let playlist = filled(PlaybackMode::OneShot, RecordingTransport::playing(), &w);
    playlist.point_to(2).unwrap();

    playlist.remove(4).unwrap();
    assert!(playlist.current_item().unwrap().ptr_eq(&w[2]));
    playlist.remove(0).unwrap();
    assert_eq!(playlist.current_index(), Some(1));
    assert!(playlist.current_item().unwrap().ptr_eq(&w[2]));
}

#[test]
fn out_of_range_mutations_are_rejected_unchanged() {
    let (_cache, w) = radios(2);
    let playlist = filled(PlaybackMode::OneShot, RecordingTransport::idle(), &w);
    playlist.point_to(1).unwrap();

    assert!(matches!(
        playlist.remove(2),
        Err(Error::InvalidMutation { index: 2, len: 2 })
    ));
    assert!(matches!(
        playlist.insert(3, w[0].clone()),
        Err(Error::InvalidMutation { index: 3, len: 2 })
    ));
    assert!(playlist.point_to(5).is_err());
    assert!(playlist.skip_to(2).is_err());
    assert_eq!(playlist.len(), 2);
    assert_eq!(playlist.current_index(), Some(1));
}

#[test]
fn insert_then_remove_is_a_no_op() {
    let (_cache, w) = radios(5);
    let extra = w[4].clone();
    for i in 0..=4 {
        let playlist = filled(PlaybackMode::OneShot, RecordingTransport::playing(), &w[..4]);
        playlist.point_to(2).unwrap();
        let before = playlist.entries();

        playlist.insert(i, extra.clone()).unwrap();
        assert!(playlist.current_item().unwrap().ptr_eq(&w[2]));
        playlist.remove(i).unwrap();

        assert_eq!(playlist.entries(), before);
        assert_eq!(playlist.current_index(), Some(2));
    }
}

#[test]
fn randomize_keeps_current_slot_and_permutes_the_rest_uniformly() {
    let (_cache, w) = radios(5);
    let playlist = filled(PlaybackMode::Random, RecordingTransport::idle(), &w);
    playlist.point_to(2).unwrap();

    let mut first_slot: HashMap<String, usize> = HashMap::new();
    for _ in 0..100 {
        playlist.randomize();
        let entries = playlist.entries();
        assert!(entries[2].ptr_eq(&w[2]));
        assert_eq!(playlist.current_index(), Some(2));

        let mut ids: Vec<&str> = entries.iter().map(Wrapper::id).collect();
        let mut expected: Vec<&str> = w.iter().map(Wrapper::id).collect();
        ids.sort();
        expected.sort();
        assert_eq!(ids, expected);

        *first_slot.entry(entries[0].title()).or_default() += 1;
    }

    // Four candidates, 25 expected each.
    assert_eq!(first_slot.len(), 4);
    assert!(first_slot.values().all(|&n| (5..=50).contains(&n)));
    assert!(!first_slot.contains_key("R2"));
}

#[test]
fn one_shot_advance_stops_at_the_end_without_wrapping() {
    let (_cache, w) = radios(4);
    let playlist = filled(PlaybackMode::OneShot, RecordingTransport::playing(), &w[..3]);

    assert!(playlist.advance().unwrap().ptr_eq(&w[0]));
    assert!(playlist.next_item().unwrap().ptr_eq(&w[1]));
    assert!(playlist.advance().unwrap().ptr_eq(&w[1]));
    assert!(playlist.advance().unwrap().ptr_eq(&w[2]));
    assert!(playlist.advance().is_none());
    assert_eq!(playlist.current_index(), Some(2));

    playlist.append(w[3].clone());
    assert!(playlist.advance().unwrap().ptr_eq(&w[3]));
}

#[test]
fn advance_on_empty_playlist_returns_nothing() {
    let playlist = Playlist::new(PlaybackMode::Random, RecordingTransport::idle());
    assert!(playlist.advance().is_none());
    assert_eq!(playlist.current_index(), None);
}

#[test]
fn repeat_reinserts_current_after_itself() {
    let (_cache, w) = radios(3);
    let playlist = filled(PlaybackMode::Repeat, RecordingTransport::playing(), &w);
    assert!(matches!(playlist.repeat_current(1), Err(Error::NotFound(_))));

    playlist.advance();
    let repeated = playlist.repeat_current(2).unwrap();
    assert!(repeated.ptr_eq(&w[0]));
    assert_eq!(titles(&playlist), vec!["R0", "R0", "R0", "R1", "R2"]);
    assert_eq!(playlist.current_index(), Some(0));

    assert!(playlist.advance().unwrap().ptr_eq(&w[0]));
    assert!(playlist.advance().unwrap().ptr_eq(&w[0]));
    assert!(playlist.advance().unwrap().ptr_eq(&w[1]));
}

#[test]
fn random_advance_plays_each_entry_once_per_pass_then_restarts() {
    let (_cache, w) = radios(5);
    let playlist = filled(PlaybackMode::Random, RecordingTransport::playing(), &w);

    let mut played: Vec<String> = (0..5)
        .map(|_| playlist.advance().unwrap().id().to_string())
        .collect();
    played.sort();
    let mut all: Vec<String> = w.iter().map(|x| x.id().to_string()).collect();
    all.sort();
    assert_eq!(played, all);
    assert_eq!(playlist.current_index(), Some(4));

    assert!(playlist.advance().is_some());
    assert_eq!(playlist.current_index(), Some(0));
    assert_eq!(playlist.len(), 5);
}

#[test]
fn skip_to_reaches_the_chosen_entry_even_in_random_mode() {
    let (_cache, w) = radios(5);
    let transport = RecordingTransport::playing();
    let playlist = filled(PlaybackMode::Random, transport.clone(), &w);
    playlist.advance();

    let target = playlist.get(3).unwrap();
    playlist.skip_to(3).unwrap();
    assert_eq!(transport.interrupt_count(), 1);
    assert!(playlist.next_item().unwrap().ptr_eq(&target));
    assert!(playlist.advance().unwrap().ptr_eq(&target));

    transport.set_playing(false);
    let target = playlist.get(1).unwrap();
    playlist.skip_to(1).unwrap();
    assert_eq!(playlist.current_index(), Some(0));
    assert_eq!(transport.interrupt_count(), 1);
    assert_eq!(transport.advance_count(), 1);
    assert!(playlist.advance().unwrap().ptr_eq(&target));
}

struct FixedSuggestion {
    pick: Wrapper,
    playlist: OnceLock<Arc<Playlist>>,
}

impl SuggestionSource for FixedSuggestion {
    fn suggest(&self, _last: &Wrapper) -> Option<Wrapper> {
        // Touching the playlist here would deadlock if advance held its lock.
        if let Some(p) = self.playlist.get() {
            assert!(!p.is_empty());
        }
        Some(self.pick.clone())
    }
}

#[test]
fn autoplay_appends_a_suggestion_when_the_queue_runs_out() {
    let (_cache, w) = radios(3);
    let source = Arc::new(FixedSuggestion {
        pick: w[2].clone(),
        playlist: OnceLock::new(),
    });
    let playlist = Arc::new(
        Playlist::new(PlaybackMode::Autoplay, RecordingTransport::playing())
            .with_suggestions(source.clone()),
    );
    let _ = source.playlist.set(playlist.clone());
    playlist.extend(w[..2].to_vec());

    playlist.advance();
    playlist.advance();
    let suggested = playlist.advance().unwrap();
    assert!(suggested.ptr_eq(&w[2]));
    assert_eq!(playlist.len(), 3);
    assert_eq!(playlist.current_index(), Some(2));
}

#[test]
fn autoplay_without_a_source_behaves_like_one_shot() {
    let (_cache, w) = radios(1);
    let playlist = filled(PlaybackMode::Autoplay, RecordingTransport::playing(), &w);
    playlist.advance();
    assert!(playlist.advance().is_none());
    assert_eq!(playlist.len(), 1);
}

#[test]
fn remove_by_id_drops_every_copy_and_interrupts_once() {
    let (_cache, w) = radios(3);
    let transport = RecordingTransport::playing();
    let playlist = filled(
        PlaybackMode::OneShot,
        transport.clone(),
        &[w[0].clone(), w[1].clone(), w[0].clone(), w[2].clone()],
    );
    playlist.point_to(2).unwrap();

    assert_eq!(playlist.remove_by_id(w[0].id()), 2);
    assert_eq!(titles(&playlist), vec!["R1", "R2"]);
    assert_eq!(playlist.current_index(), Some(0));
    assert_eq!(transport.interrupt_count(), 1);
    assert!(playlist.advance().unwrap().ptr_eq(&w[2]));

    assert_eq!(playlist.remove_by_id("missing"), 0);
}

#[test]
fn clear_and_restore_reset_the_cursor() {
    let (_cache, w) = radios(3);
    let playlist = filled(PlaybackMode::OneShot, RecordingTransport::idle(), &w);
    playlist.point_to(1).unwrap();

    let (ids, current) = playlist.ids();
    assert_eq!(ids.len(), 3);
    assert_eq!(current, Some(1));

    playlist.clear();
    assert!(playlist.is_empty());
    assert_eq!(playlist.current_index(), None);

    playlist.restore(w.clone(), Some(7));
    assert_eq!(playlist.len(), 3);
    assert_eq!(playlist.current_index(), None);
    playlist.restore(w.clone(), Some(2));
    assert_eq!(playlist.current_index(), Some(2));
}

#[test]
fn concurrent_appends_and_advances_keep_the_cursor_in_bounds() {
    let (_cache, w) = radios(4);
    let playlist = Playlist::new(PlaybackMode::OneShot, RecordingTransport::playing());

    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..200 {
                playlist.append(w[i % 4].clone());
            }
        });
        s.spawn(|| {
            for _ in 0..200 {
                playlist.advance();
                if let Some(c) = playlist.current_index() {
                    assert!(c < playlist.len());
                }
            }
        });
    });

    assert_eq!(playlist.len(), 200);
    playlist.advance();
    assert!(playlist.current_index().is_some_and(|c| c < 200));
}

#[test]
fn playback_mode_parses_names_and_aliases() {
    assert_eq!("one-shot".parse::<PlaybackMode>().unwrap(), PlaybackMode::OneShot);
    assert_eq!("Shuffle".parse::<PlaybackMode>().unwrap(), PlaybackMode::Random);
    assert_eq!(" autoplay ".parse::<PlaybackMode>().unwrap(), PlaybackMode::Autoplay);
    assert_eq!("loop".parse::<PlaybackMode>().unwrap(), PlaybackMode::Repeat);
    assert!("party".parse::<PlaybackMode>().is_err());
    assert_eq!(PlaybackMode::OneShot.to_string(), "one-shot");
}

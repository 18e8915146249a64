use std::fs;
use std::io::Write;
use std::sync::{Arc, Barrier};
use std::thread;

use bitgit_utils::lockfile::LockFile;

#[test]
fn only_one_thread_wins_the_lock() {
    let dir = tempfile::tempdir().unwrap();
    let target = Arc::new(dir.path().join("config"));
    let start = Arc::new(Barrier::new(8));
    let hold = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let target = Arc::clone(&target);
            let start = Arc::clone(&start);
            let hold = Arc::clone(&hold);
            thread::spawn(move || {
                start.wait();
                let lock = LockFile::acquire(&*target);
                let won = lock.is_ok();
                hold.wait();
                drop(lock);
                won
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|&won| won)
        .count();
    assert_eq!(winners, 1);
}

#[test]
fn commit_then_reacquire() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("output");

    for i in 0..5 {
        let mut lock = LockFile::acquire(&target).unwrap();
        write!(lock, "iteration {i}").unwrap();
        lock.commit().unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), format!("iteration {i}"));
    }
}

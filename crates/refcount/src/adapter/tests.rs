use std::sync::{Arc, Barrier};
use std::sync::atomic::{AtomicUsize, Ordering};

use ngs_itf::{DispatchError, DispatchTable, ErrBlock, ErrorKind};
use pretty_assertions::assert_eq;

use super::*;
use crate::{Handle, NGS_REFCOUNT_V1, Refcount, duplicate, release};

struct Tracked {
	drops: Arc<AtomicUsize>,
	whacks: Arc<AtomicUsize>,
}

impl Tracked {
	fn new() -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
		let drops = Arc::new(AtomicUsize::new(0));
		let whacks = Arc::new(AtomicUsize::new(0));
		(
			Self {
				drops: drops.clone(),
				whacks: whacks.clone(),
			},
			drops,
			whacks,
		)
	}
}

impl Drop for Tracked {
	fn drop(&mut self) {
		self.drops.fetch_add(1, Ordering::SeqCst);
	}
}

static TRACKED_FNS: RefcountFns = RefcountFns::of::<Tracked>();
static TRACKED_VT: DispatchTable = DispatchTable::new("Tracked", &NGS_REFCOUNT_V1, 0, None, &TRACKED_FNS);

// SAFETY: TRACKED_VT carries RefcountFns::of::<Tracked>.
unsafe impl Refcounted for Tracked {
	fn dispatch_table() -> &'static DispatchTable {
		&TRACKED_VT
	}

	fn whack(&mut self) -> Result<(), DispatchError> {
		self.whacks.fetch_add(1, Ordering::SeqCst);
		Ok(())
	}
}

struct Grumpy;

static GRUMPY_FNS: RefcountFns = RefcountFns::of::<Grumpy>();
static GRUMPY_VT: DispatchTable = DispatchTable::new("Grumpy", &NGS_REFCOUNT_V1, 0, None, &GRUMPY_FNS);

// SAFETY: GRUMPY_VT carries RefcountFns::of::<Grumpy>.
unsafe impl Refcounted for Grumpy {
	fn dispatch_table() -> &'static DispatchTable {
		&GRUMPY_VT
	}

	fn whack(&mut self) -> Result<(), DispatchError> {
		panic!("whack exploded");
	}
}

fn count(raw: RawHandle) -> usize {
	// SAFETY: tests only call this on live Tracked objects.
	unsafe { RcObject::<Tracked>::from_header(raw.as_ptr()) }
		.refcount
		.load(Ordering::SeqCst)
}

#[test]
fn release_of_none_is_a_no_op() {
	unsafe { release(None) };
}

#[test]
fn duplicate_of_none_is_null_object_access() {
	assert_eq!(unsafe { duplicate(None) }, Err(DispatchError::NullObjectAccess));
}

#[test]
fn refcount_state_machine() {
	let (value, drops, whacks) = Tracked::new();
	let raw = RcObject::new_raw(value);
	assert_eq!(count(raw), 1);

	let dup = unsafe { duplicate(Some(raw)) }.unwrap();
	assert_eq!(dup, raw);
	assert_eq!(count(raw), 2);

	unsafe { release(Some(dup)) };
	assert_eq!(count(raw), 1);
	assert_eq!(drops.load(Ordering::SeqCst), 0);

	unsafe { release(Some(raw)) };
	assert_eq!(whacks.load(Ordering::SeqCst), 1);
	assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn concurrent_duplicate_and_release_destroy_exactly_once() {
	let (value, drops, whacks) = Tracked::new();
	let raw = RcObject::new_raw(value);

	std::thread::scope(|s| {
		for _ in 0..8 {
			s.spawn(move || {
				for _ in 0..1_000 {
					let dup = unsafe { duplicate(Some(raw)) }.unwrap();
					unsafe { release(Some(dup)) };
				}
			});
		}
	});

	assert_eq!(count(raw), 1);
	assert_eq!(drops.load(Ordering::SeqCst), 0);
	unsafe { release(Some(raw)) };
	assert_eq!(whacks.load(Ordering::SeqCst), 1);
	assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn simultaneous_final_releases_destroy_exactly_once() {
	let threads = 8;
	for _ in 0..200 {
		let (value, drops, whacks) = Tracked::new();
		let raw = RcObject::new_raw(value);
		let mut refs = vec![raw];
		for _ in 1..threads {
			refs.push(unsafe { duplicate(Some(raw)) }.unwrap());
		}
		assert_eq!(count(raw), threads);

		let barrier = Barrier::new(threads);
		std::thread::scope(|s| {
			for r in refs {
				let barrier = &barrier;
				s.spawn(move || {
					barrier.wait();
					unsafe { release(Some(r)) };
				});
			}
		});

		assert_eq!(whacks.load(Ordering::SeqCst), 1);
		assert_eq!(drops.load(Ordering::SeqCst), 1);
	}
}

#[test]
fn handles_release_on_drop() {
	let (value, drops, _) = Tracked::new();
	let first: Handle<Refcount> = RcObject::new_handle(value).unwrap();
	assert_eq!(first.strong_count::<Tracked>(), Some(1));

	let second = first.duplicate().unwrap();
	assert_eq!(first.strong_count::<Tracked>(), Some(2));
	assert!(second.downcast_ref::<Tracked>().is_some());
	assert!(second.downcast_ref::<Grumpy>().is_none());

	drop(first);
	assert_eq!(second.strong_count::<Tracked>(), Some(1));
	drop(second);
	assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn into_raw_keeps_the_reference() {
	let (value, drops, _) = Tracked::new();
	let handle: Handle<Refcount> = RcObject::new_handle(value).unwrap();
	let raw = handle.into_raw();
	assert_eq!(count(raw), 1);

	let handle = unsafe { Handle::<Refcount>::from_raw(raw) }.unwrap();
	assert_eq!(handle.class_name(), "Tracked");
	drop(handle);
	assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn panicking_whack_is_caught_and_reported_as_runtime() {
	let raw = RcObject::new_raw(Grumpy);
	// SAFETY: the table is Grumpy's and we own the only reference.
	let fns = unsafe { raw.vt() }.functions::<RefcountFns>().unwrap();
	let mut err = ErrBlock::new();
	unsafe { (fns.release)(raw.as_ptr(), &mut err) };
	assert_eq!(err.kind(), Some(ErrorKind::Runtime));
	assert_eq!(err.message(), "whack exploded");
}

#[test]
fn panicking_whack_is_swallowed_by_release() {
	let raw = RcObject::new_raw(Grumpy);
	unsafe { release(Some(raw)) };
}

#[test]
fn trampoline_records_errors_and_returns_default() {
	let (value, _, _) = Tracked::new();
	let handle: Handle<Refcount> = RcObject::new_handle(value).unwrap();
	let this = handle.raw().as_ptr().cast_const();

	let mut err = ErrBlock::new();
	let out = unsafe { trampoline::<Tracked, _>(this, &mut err, -1, |_| Err(DispatchError::msg("no such row"))) };
	assert_eq!(out, -1);
	assert_eq!(err.kind(), Some(ErrorKind::ErrorMsg));
	assert_eq!(err.message(), "no such row");

	let mut err = ErrBlock::new();
	let out = unsafe { trampoline::<Tracked, _>(this, &mut err, -1, |_| Ok(7)) };
	assert_eq!(out, 7);
	assert!(!err.is_set());

	let mut err = ErrBlock::new();
	let out = unsafe {
		trampoline::<Tracked, i32>(ptr::null(), &mut err, -1, |_| unreachable!("null receiver"))
	};
	assert_eq!(out, -1);
	assert_eq!(err.message(), "NULL object access");
}

#[test]
fn trampoline_tolerates_a_null_error_block() {
	let (value, _, _) = Tracked::new();
	let handle: Handle<Refcount> = RcObject::new_handle(value).unwrap();
	let this = handle.raw().as_ptr().cast_const();
	let out = unsafe {
		trampoline::<Tracked, u8>(this, ptr::null_mut(), 0, |_| panic!("lost"))
	};
	assert_eq!(out, 0);
}

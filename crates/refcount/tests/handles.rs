//! Handle casting across a two-level family.

use std::ffi::c_int;

use ngs_itf::{DispatchError, DispatchTable, ErrBlock, HierarchyFault, InterfaceToken};
use ngs_refcount::{
	Handle, Interface, NGS_REFCOUNT_V1, ObjectHeader, RawHandle, RcObject, Refcount, RefcountFns,
	Refcounted, duplicate, release, trampoline,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

static NGS_COUNTER_V1: InterfaceToken = InterfaceToken::derived("NGS_Counter_v1", &NGS_REFCOUNT_V1);
static NGS_OTHER_V1: InterfaceToken = InterfaceToken::derived("NGS_Other_v1", &NGS_REFCOUNT_V1);

#[repr(C)]
struct CounterFns {
	value: unsafe extern "C" fn(this: *const ObjectHeader, err: *mut ErrBlock) -> c_int,
}

enum CounterItf {}

impl Interface for CounterItf {
	type Fns = CounterFns;

	fn token() -> &'static InterfaceToken {
		&NGS_COUNTER_V1
	}
}

enum OtherItf {}

impl Interface for OtherItf {
	type Fns = ();

	fn token() -> &'static InterfaceToken {
		&NGS_OTHER_V1
	}
}

struct Counter(c_int);

unsafe extern "C" fn counter_value(this: *const ObjectHeader, err: *mut ErrBlock) -> c_int {
	unsafe {
		trampoline::<Counter, _>(this, err, 0, |c| {
			if c.0 < 0 {
				return Err(DispatchError::msg("negative counter"));
			}
			Ok(c.0)
		})
	}
}

static COUNTER_REFCOUNT_FNS: RefcountFns = RefcountFns::of::<Counter>();
static COUNTER_FNS: CounterFns = CounterFns { value: counter_value };
static COUNTER_REFCOUNT_VT: DispatchTable =
	DispatchTable::new("Counter", &NGS_REFCOUNT_V1, 0, None, &COUNTER_REFCOUNT_FNS);
static COUNTER_VT: DispatchTable =
	DispatchTable::new("Counter", &NGS_COUNTER_V1, 0, Some(&COUNTER_REFCOUNT_VT), &COUNTER_FNS);

// SAFETY: the refcount level carries RefcountFns::of::<Counter>.
unsafe impl Refcounted for Counter {
	fn dispatch_table() -> &'static DispatchTable {
		&COUNTER_VT
	}
}

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn read(handle: &Handle<CounterItf>) -> Result<c_int, DispatchError> {
	handle.call(|fns, this, err| unsafe { (fns.value)(this, err) })
}

#[rstest]
#[case(42, Ok(42))]
#[case(-1, Err(DispatchError::msg("negative counter")))]
fn calls_through_the_derived_level(#[case] start: c_int, #[case] expected: Result<c_int, DispatchError>) {
	init_tracing();
	let handle: Handle<CounterItf> = RcObject::new_handle(Counter(start)).unwrap();
	assert_eq!(read(&handle), expected);
}

#[test]
fn upcast_and_downcast_share_the_object() {
	init_tracing();
	let counter: Handle<CounterItf> = RcObject::new_handle(Counter(5)).unwrap();
	let base = counter.cast::<Refcount>().unwrap();
	assert_eq!(base.table().itf_name(), "NGS_Refcount_v1");
	assert_eq!(counter.strong_count::<Counter>(), Some(2));

	let again = base.cast::<CounterItf>().unwrap();
	assert_eq!(read(&again), Ok(5));
	assert_eq!(base.raw(), again.raw());
	assert_eq!(counter.strong_count::<Counter>(), Some(3));
}

#[test]
fn unsupported_cast_takes_no_reference() {
	init_tracing();
	let counter: Handle<CounterItf> = RcObject::new_handle(Counter(1)).unwrap();
	assert_eq!(
		counter.cast::<OtherItf>().unwrap_err(),
		DispatchError::InterfaceNotSupported {
			interface: "NGS_Other_v1"
		}
	);
	assert_eq!(counter.strong_count::<Counter>(), Some(1));
}

static BROKEN_VT: DispatchTable = DispatchTable::new("Broken", &NGS_REFCOUNT_V1, 0, None, &());

#[test]
fn table_without_refcount_functions_is_corrupt() {
	init_tracing();
	let header: &'static mut ObjectHeader = Box::leak(Box::new(ObjectHeader::new(&BROKEN_VT)));
	let raw = RawHandle::from_ptr(header).unwrap();

	assert_eq!(
		unsafe { duplicate(Some(raw)) },
		Err(DispatchError::CorruptHierarchy(HierarchyFault::TableType {
			class: "Broken",
			interface: "NGS_Refcount_v1",
		}))
	);
	// Logged and swallowed.
	unsafe { release(Some(raw)) };
}

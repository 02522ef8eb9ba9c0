//! `NGS_String_v1` end to end: adapter, handles, casting, versioning.

use ngs_demo_engine::{EngineString, LegacyString, NgsString, StringItf, register, tables};
use ngs_itf::{DispatchError, ErrorKind, RegistryBuilder};
use ngs_refcount::{Handle, NGS_REFCOUNT_V1, Refcount};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[rstest]
#[case::ascii("ACGTACGT")]
#[case::empty("")]
#[case::multibyte("αβγ reads")]
fn data_and_size_round_trip(#[case] text: &str) {
	init_tracing();
	let s = EngineString::make(text).unwrap();
	assert_eq!(s.size(), Ok(text.len()));
	assert_eq!(s.data(), Ok(text));

	let legacy = LegacyString::make(text).unwrap();
	assert_eq!(legacy.data(), Ok(text));
}

#[test]
fn substr_outlives_its_source() {
	init_tracing();
	let s = EngineString::make("GATTACA").unwrap();
	let sub = s.substr(1, 3).unwrap();
	drop(s);
	assert_eq!(sub.data(), Ok("ATT"));
	assert_eq!(sub.handle().strong_count::<EngineString>(), Some(1));
}

#[rstest]
#[case(5, 10)]
#[case(usize::MAX, 2)]
fn substr_out_of_range_fails(#[case] offset: usize, #[case] size: usize) {
	init_tracing();
	let s = EngineString::make("GATTACA").unwrap();
	let err = s.substr(offset, size).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::ErrorMsg);
	assert!(err.to_string().contains("out of range"), "{err}");
	assert_eq!(s.handle().strong_count::<EngineString>(), Some(1));
}

#[test]
fn substr_splitting_a_character_fails() {
	let s = EngineString::make("αβ").unwrap();
	assert!(s.substr(1, 2).is_err());
}

#[test]
fn legacy_strings_are_too_old_for_substr() {
	init_tracing();
	let s = LegacyString::make("ACGT").unwrap();
	assert_eq!(
		s.substr(0, 1).unwrap_err(),
		DispatchError::InterfaceTooOld {
			interface: "NGS_String_v1",
			required: 1,
			provided: 0,
		}
	);
}

#[test]
fn casts_between_string_and_refcount_views() {
	init_tracing();
	let s = EngineString::make("CCC").unwrap();
	let base: Handle<Refcount> = s.handle().cast::<Refcount>().unwrap();
	assert_eq!(base.table().itf_name(), NGS_REFCOUNT_V1.name());
	assert_eq!(base.class_name(), "EngineString");

	let back = NgsString::new(base.cast::<StringItf>().unwrap());
	assert_eq!(back.data(), Ok("CCC"));
	assert_eq!(s.handle().strong_count::<EngineString>(), Some(3));
	assert!(back.handle().downcast_ref::<LegacyString>().is_none());
}

#[test]
fn registry_casts_by_name() {
	init_tracing();
	let registry = RegistryBuilder::new("engine").interface(&NGS_REFCOUNT_V1).build().unwrap();
	register(&registry).unwrap();
	assert_eq!(registry.tables().len(), 2);
	for table in tables() {
		assert!(table.cache().is_some(), "{} not primed", table.class_name());
	}

	let s = LegacyString::make("T").unwrap();
	let vt = s.handle().vt();
	let table = registry.cast_by_name(Some(vt), "NGS_String_v1").unwrap();
	assert_eq!(table.minor_version(), 0);
	assert_eq!(
		registry.cast_by_name(Some(vt), "NGS_Read_v1"),
		Err(DispatchError::InterfaceNotSupported {
			interface: "<unregistered>"
		})
	);
}

#[test]
fn strings_are_shared_across_threads() {
	init_tracing();
	let s = EngineString::make("ACGT".repeat(64)).unwrap();
	std::thread::scope(|scope| {
		for i in 0..8 {
			let s = &s;
			scope.spawn(move || {
				for _ in 0..200 {
					let dup = s.duplicate().unwrap();
					let sub = dup.substr(i, 4).unwrap();
					assert_eq!(sub.size(), Ok(4));
				}
			});
		}
	});
	assert_eq!(s.handle().strong_count::<EngineString>(), Some(1));
}

proptest! {
	#[test]
	fn substr_matches_str_slicing(text in "[ACGT]{0,64}", offset in 0usize..80, size in 0usize..80) {
		let s = EngineString::make(text.as_str()).unwrap();
		match text.get(offset..offset + size) {
			Some(expected) => {
				let sub = s.substr(offset, size).unwrap();
				prop_assert_eq!(sub.data().unwrap(), expected);
			}
			None => prop_assert!(s.substr(offset, size).is_err()),
		}
	}
}

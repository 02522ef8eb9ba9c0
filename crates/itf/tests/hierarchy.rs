//! End-to-end casting over a small interface family.

use ngs_itf::{
	DispatchError, DispatchTable, ErrBlock, ErrorKind, HierarchyFault, InterfaceToken,
	RegistryBuilder, cast,
};

static REFCOUNT: InterfaceToken = InterfaceToken::root("NGS_Refcount_v1");
static FRAGMENT: InterfaceToken = InterfaceToken::derived("NGS_Fragment_v1", &REFCOUNT);
static ALIGNMENT: InterfaceToken = InterfaceToken::derived("NGS_Alignment_v1", &FRAGMENT);
static READ: InterfaceToken = InterfaceToken::derived("NGS_Read_v1", &FRAGMENT);

struct FragmentFns {
	bases: fn() -> &'static str,
}

struct AlignmentFns {
	map_qual: fn() -> i32,
	/// 1.1
	rna_orientation: Option<fn() -> char>,
}

fn align_bases() -> &'static str {
	"ACGT"
}

fn align_map_qual() -> i32 {
	60
}

static ALIGN_FRAGMENT_FNS: FragmentFns = FragmentFns { bases: align_bases };
static ALIGN_FNS: AlignmentFns = AlignmentFns {
	map_qual: align_map_qual,
	rna_orientation: None,
};

static ALIGN_REFCOUNT_VT: DispatchTable = DispatchTable::new("CSRA1_Alignment", &REFCOUNT, 0, None, &());
static ALIGN_FRAGMENT_VT: DispatchTable = DispatchTable::new(
	"CSRA1_Alignment",
	&FRAGMENT,
	0,
	Some(&ALIGN_REFCOUNT_VT),
	&ALIGN_FRAGMENT_FNS,
);
static ALIGN_VT: DispatchTable = DispatchTable::new(
	"CSRA1_Alignment",
	&ALIGNMENT,
	0,
	Some(&ALIGN_FRAGMENT_VT),
	&ALIGN_FNS,
);

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn typed_calls_through_every_level() {
	init_tracing();
	let registry = RegistryBuilder::new("engine")
		.interfaces([&ALIGNMENT, &READ])
		.table(&ALIGN_VT)
		.build()
		.expect("consistent tables");
	assert_eq!(ALIGN_VT.cache().map(|cache| cache.resolved_levels()), Some(3));

	let frag = ALIGN_VT.cast(&FRAGMENT).unwrap();
	let fns = frag.functions::<FragmentFns>().expect("fragment layout");
	assert_eq!((fns.bases)(), "ACGT");

	let align = registry.cast_by_name(Some(&ALIGN_VT), "NGS_Alignment_v1").unwrap();
	let fns = align.functions::<AlignmentFns>().unwrap();
	assert_eq!((fns.map_qual)(), 60);
	assert!(align.functions::<FragmentFns>().is_none());

	assert_eq!(
		align.require_minor(1),
		Err(DispatchError::InterfaceTooOld {
			interface: "NGS_Alignment_v1",
			required: 1,
			provided: 0,
		})
	);
	assert!(fns.rna_orientation.is_none());

	assert_eq!(
		cast(Some(&ALIGN_VT), &READ),
		Err(DispatchError::InterfaceNotSupported {
			interface: "NGS_Read_v1"
		})
	);
}

#[test]
fn corrupt_hierarchy_travels_through_an_error_block() {
	init_tracing();
	let root = DispatchTable::new("Mixed", &REFCOUNT, 0, None, &()).leak();
	let mid = DispatchTable::new("Mixed", &READ, 0, Some(root), &()).leak();
	let leaf = DispatchTable::new("Mixed", &ALIGNMENT, 0, Some(mid), &()).leak();

	let err = leaf.cast(&REFCOUNT).unwrap_err();
	assert!(matches!(
		err,
		DispatchError::CorruptHierarchy(HierarchyFault::NameMismatch { depth: 2, .. })
	));

	let mut block = ErrBlock::new();
	block.record(&err);
	assert_eq!(block.kind(), Some(ErrorKind::Internal));
	assert!(block.message().starts_with("corrupt interface hierarchy"));
}

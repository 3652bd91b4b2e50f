mod generic_writer;
pub use generic_writer::{GenericWriter, WriterError};

mod tables;
pub use tables::{
    write_candidates,
    write_id_list,
    write_kinship_matrix,
    write_missing_report,
    write_repair_stats,
    write_repaired_pedigree,
};

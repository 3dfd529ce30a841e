mod devices;
mod neighbors;
mod records;
mod topology;

pub use devices::*;
pub use neighbors::*;
pub use records::*;
pub use topology::*;

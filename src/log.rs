//! Thin re-export of the `log` macros so call sites read `trace!`/`debug!`/... without an
//! explicit `use log::*` in every module, mirroring EtherCrab's `log`/`defmt` shim (we only ever
//! build against `std`, so there is no second backend to switch on here).

#![macro_use]
#![allow(unused_imports)]

pub(crate) use log::{debug, error, info, trace, warn};

//! Service façades for DrChrono API resources.
//!
//! Each service shapes paths and parameters for one resource family and
//! delegates to the shared transport. Responses stay raw JSON; the
//! provider's schemas evolve too often to pin here.

pub mod appointments;
pub mod billing;
pub mod care_plans;
pub mod doctors;
pub mod documents;
pub mod offices;
pub mod patients;
pub mod tasks;
pub mod users;

pub use appointments::{AppointmentsService, AppointmentsServiceTrait};
pub use billing::{BillingService, BillingServiceTrait};
pub use care_plans::{CarePlansService, CarePlansServiceTrait};
pub use doctors::{DoctorsService, DoctorsServiceTrait};
pub use documents::{DocumentsService, DocumentsServiceTrait};
pub use offices::{OfficesService, OfficesServiceTrait};
pub use patients::{PatientsService, PatientsServiceTrait};
pub use tasks::{TasksService, TasksServiceTrait};
pub use users::{UsersService, UsersServiceTrait};

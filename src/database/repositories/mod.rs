pub mod employee;
pub mod leave;

pub use employee::EmployeeRepository;
pub use leave::LeaveRepository;

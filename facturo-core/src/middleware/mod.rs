mod tenant;

pub use tenant::OrgContext;

mod error;
mod functions;
mod io;
mod problem;
mod quadrature;

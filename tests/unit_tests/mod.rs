mod assembly;
mod boundary;
mod solver;
mod stencil;

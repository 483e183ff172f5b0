mod helpers;
mod master;

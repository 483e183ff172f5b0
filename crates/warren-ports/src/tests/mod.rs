mod binder;

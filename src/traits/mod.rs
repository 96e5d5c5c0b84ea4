pub mod taylor_std_ops;

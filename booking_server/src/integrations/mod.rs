pub mod midtrans;

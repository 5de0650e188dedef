//! An implementation of a CHIP-8 virtual machine. The implementation follows the instruction
//! set described [here](http://devernay.free.fr/hacks/chip8/C8TECH10.HTM), including the
//! 35 standard instructions, bounds-checked memory and a clock that paces instruction
//! execution, the 60Hz timers and display refreshes independently of one another.
//! For terminal output it relies on the cursive text user interface library.
pub mod chip;

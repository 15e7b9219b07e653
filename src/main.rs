fn main() {
    juma_vmc_lib::run()
}
